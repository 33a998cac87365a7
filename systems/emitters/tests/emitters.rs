use std::collections::HashSet;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tilegen_core::{
    Command, Coordinate, Direction, Domain, DomainShape, Intensity, JitterClamp, Palette,
    Profile, ProfileId, PropagationKind, RuleMode, MAX_RULE_THRESHOLD,
};
use tilegen_system_emitters::{track_length_ceiling, CommandEmitters, EmitterSettings};
use tilegen_system_rules::RuleGenerator;
use tilegen_system_sampler::SpatialSampler;

fn emitters(shape: DomainShape, bound: i64, palette: &[&str]) -> CommandEmitters {
    let domain = Domain::new(shape, bound).expect("valid domain");
    CommandEmitters::new(EmitterSettings {
        sampler: SpatialSampler::new(domain, JitterClamp::Both),
        rules: RuleGenerator::new(RuleMode::WithoutReplacement, MAX_RULE_THRESHOLD)
            .expect("valid generator"),
        palette: Palette::new(palette.iter().copied()).expect("valid palette"),
        intensity: true,
        maybe_reorder: true,
        link_radius: 3,
    })
}

fn lines(commands: impl IntoIterator<Item = Command>) -> Vec<String> {
    commands.into_iter().map(|command| command.to_string()).collect()
}

#[test]
fn query_all_over_unit_domain_matches_expected_order() {
    let emitters = emitters(DomainShape::ZeroBased, 1, &["q"]);
    assert_eq!(
        lines(emitters.query_all()),
        vec!["? 0 0", "? 1 0", "? 0 1", "? 1 1"],
    );
}

#[test]
fn query_all_enumerates_every_cell_once_in_row_major_order() {
    for (shape, bound) in [(DomainShape::ZeroBased, 7), (DomainShape::Symmetric, 4)] {
        let emitters = emitters(shape, bound, &["q"]);
        let domain = emitters.settings().sampler.domain();
        let visited: Vec<Coordinate> = emitters
            .query_all()
            .map(|command| match command {
                Command::QueryTile { at } => at,
                other => panic!("unexpected command {other:?}"),
            })
            .collect();

        assert_eq!(visited.len() as u64, domain.side() * domain.side());
        let unique: HashSet<_> = visited.iter().copied().collect();
        assert_eq!(unique.len(), visited.len(), "scan produced duplicates");

        let ordered = visited
            .windows(2)
            .all(|pair| (pair[0].y(), pair[0].x()) < (pair[1].y(), pair[1].x()));
        assert!(ordered, "scan is not ascending row-major");
        assert_eq!(visited.first(), Some(&Coordinate::new(domain.lo(), domain.lo())));
        assert_eq!(visited.last(), Some(&Coordinate::new(domain.hi(), domain.hi())));
    }
}

#[test]
fn block_place_emits_paired_lines_for_one_coordinate() {
    let emitters = emitters(DomainShape::Symmetric, 50, &["q", "w"]);
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    for _ in 0..200 {
        let mut out = Vec::new();
        emitters.block_place(&mut rng, &mut out);
        match out.as_slice() {
            [Command::PlaceBlock { at: first }, Command::Homogenize { at: second }] => {
                assert_eq!(first, second);
            }
            other => panic!("unexpected block emission {other:?}"),
        }
    }
}

#[test]
fn tile_create_carries_palette_color_and_bounded_intensity() {
    let emitters = emitters(DomainShape::ZeroBased, 20, &["red", "green"]);
    let mut rng = ChaCha8Rng::seed_from_u64(2);

    for _ in 0..1_000 {
        match emitters.tile_create(&mut rng) {
            Command::CreateTile {
                at,
                color,
                intensity: Some(intensity),
            } => {
                assert!(emitters.settings().sampler.domain().contains(at));
                assert!(["red", "green"].contains(&color.as_str()));
                assert!((Intensity::MIN..=Intensity::MAX).contains(&intensity.get()));
            }
            other => panic!("unexpected tile emission {other:?}"),
        }
    }
}

#[test]
fn tile_create_omits_intensity_when_disabled() {
    let mut profile = Profile::canonical(ProfileId::V1).expect("valid profile");
    profile.intensity = false;
    let emitters = CommandEmitters::from_profile(&profile).expect("valid emitters");
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let line = emitters.tile_create(&mut rng).to_string();
    assert_eq!(line.split(' ').count(), 4, "unexpected shape {line}");
}

#[test]
fn propagation_alternates_kinds_by_index() {
    let emitters = emitters(DomainShape::ZeroBased, 20, &["q"]);
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let mut reorders = 0;

    for index in 0..2_000u64 {
        let mut out = Vec::new();
        let reordered = emitters.propagate_step(&mut rng, index, &mut out);
        let expected = if index % 2 == 0 {
            PropagationKind::Single
        } else {
            PropagationKind::Block
        };
        assert!(matches!(out[0], Command::Propagate { kind, .. } if kind == expected));

        if reordered {
            reorders += 1;
            assert_eq!(out[1..], [Command::Reorder, Command::Sort]);
        } else {
            assert_eq!(out.len(), 1);
        }
    }

    assert!(
        (100..=300).contains(&reorders),
        "reorder rate far from one in ten: {reorders}/2000"
    );
}

#[test]
fn propagation_never_reorders_when_disabled() {
    let profile = Profile::canonical(ProfileId::V2).expect("valid profile");
    let emitters = CommandEmitters::from_profile(&profile).expect("valid emitters");
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    for index in 0..500 {
        let mut out = Vec::new();
        assert!(!emitters.propagate_step(&mut rng, index, &mut out));
        assert_eq!(out.len(), 1);
    }
}

#[test]
fn tracks_use_known_codes_within_length_ceiling() {
    let emitters = emitters(DomainShape::ZeroBased, 50, &["q"]);
    let ceiling = track_length_ceiling(emitters.settings().sampler.domain());
    assert_eq!(ceiling, 7);
    let mut rng = ChaCha8Rng::seed_from_u64(6);
    let mut longest = 0;

    for _ in 0..1_000 {
        let line = emitters.track_define(&mut rng).to_string();
        let fields: Vec<&str> = line.split(' ').collect();
        assert_eq!(fields[0], "t");
        let steps = &fields[3..];
        assert!((1..=ceiling).contains(&steps.len()), "bad length in {line}");
        assert!(steps.iter().all(|code| Direction::from_code(code).is_some()));
        longest = longest.max(steps.len());
    }

    assert_eq!(longest, ceiling, "track lengths never reached the ceiling");
}

#[test]
fn even_links_stay_local_and_odd_links_roam() {
    let emitters = emitters(DomainShape::ZeroBased, 1_000, &["q"]);
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut far_odd_links = 0;

    for index in 0..400u64 {
        let Command::DefineLink { from, to } = emitters.link_define(&mut rng, index) else {
            panic!("link emitter produced another command");
        };
        let distance = (from.x() - to.x()).abs().max((from.y() - to.y()).abs());
        if index % 2 == 0 {
            assert!(distance <= 3, "local link spans {distance}");
        } else if distance > 3 {
            far_odd_links += 1;
        }
    }

    assert!(far_odd_links > 150, "uniform links look local: {far_odd_links}");
}

#[test]
fn emitted_coordinates_respect_the_domain() {
    let emitters = emitters(DomainShape::Symmetric, 6, &["q", "w", "e"]);
    let domain = emitters.settings().sampler.domain();
    let mut rng = ChaCha8Rng::seed_from_u64(8);

    for index in 0..500u64 {
        let mut out = vec![
            emitters.tile_create(&mut rng),
            emitters.tile_deactivate(&mut rng),
            emitters.track_define(&mut rng),
            emitters.link_define(&mut rng, index),
        ];
        emitters.block_place(&mut rng, &mut out);
        let _ = emitters.propagate_step(&mut rng, index, &mut out);

        for command in out {
            let points = match command {
                Command::CreateTile { at, .. }
                | Command::DeactivateTile { at }
                | Command::PlaceBlock { at }
                | Command::Homogenize { at }
                | Command::Propagate { at, .. } => vec![at],
                Command::DefineTrack { origin, .. } => vec![origin],
                Command::DefineLink { from, to } => vec![from, to],
                _ => Vec::new(),
            };
            for at in points {
                assert!(domain.contains(at), "{at} escaped the domain");
            }
        }
    }
}
