use glam::{Vec2, Vec3, Vec4};
use velum::{cpu::CpuSimulation, mesh, ClothDesc, ClothError, PhysicalConstants, RestLengths};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn unit_grid(width: u32, height: u32) -> ClothDesc {
    ClothDesc::new(width, height, RestLengths::from_spacing(1., 1.))
}

#[test]
fn initial_positions_read_back_exactly() {
    init_logger();
    let desc = ClothDesc::new(6, 4, RestLengths::from_spacing(0.25, 0.5));
    let sim = CpuSimulation::new(&desc).unwrap();

    assert_eq!(sim.positions().len(), 24);
    for (idx, p) in sim.positions().iter().enumerate() {
        let (x, y) = (idx % 6, idx / 6);
        assert_eq!(*p, Vec4::new(x as f32 * 0.25, y as f32 * 0.5, 0., 1.));
    }
    assert!(sim.velocities().iter().all(|v| *v == Vec4::ZERO));
}

#[test]
fn flat_sheet_normals_share_direction() {
    init_logger();
    let sim = CpuSimulation::new(&unit_grid(7, 5)).unwrap();
    for n in sim.normals() {
        assert!(n.abs_diff_eq(Vec4::new(0., 0., 1., 0.), 1e-6), "{n}");
    }
}

#[test]
fn equilibrium_is_idempotent() {
    init_logger();
    let desc = unit_grid(5, 5).with_constants(PhysicalConstants {
        gravity: Vec3::ZERO,
        ..Default::default()
    });
    let mut sim = CpuSimulation::new(&desc).unwrap();
    let before = sim.positions().to_vec();

    for _ in 0..10 {
        sim.step(0.001);
    }

    assert_eq!(sim.positions(), &before[..]);
    assert!(sim.velocities().iter().all(|v| *v == Vec4::ZERO));
}

#[test]
fn four_by_four_falls_under_gravity() {
    init_logger();
    let dt = 0.000005;
    let desc = unit_grid(4, 4).with_constants(PhysicalConstants {
        gravity: Vec3::new(0., -10., 0.),
        particle_mass: 0.1,
        ..Default::default()
    });
    let mut sim = CpuSimulation::new(&desc).unwrap();
    let before = sim.positions().to_vec();

    sim.step(dt);

    let grid = sim.grid();
    for (idx, (p, v)) in sim.positions().iter().zip(sim.velocities()).enumerate() {
        let (x, y) = grid.coords(idx);
        if y == 3 {
            // W = 4 pins the whole top row
            assert_eq!(*p, before[idx]);
            assert_eq!(*v, Vec4::ZERO);
            continue;
        }

        let expected_v = -10. * dt;
        assert!((v.y - expected_v).abs() < 1e-9, "({x}, {y}) v = {v}");
        assert_eq!((v.x, v.z), (0., 0.));
        assert!(p.y <= before[idx].y);
        assert_eq!((p.x, p.z), (before[idx].x, before[idx].z));
    }

    // Rows above 0 sit at y >= 1 where the sub-ulp drop vanishes; the bottom row
    // starts at y = 0 and shows it: v_next * dt + 0.5 * a * dt^2 = 1.5 * g * dt^2.
    let drop = sim.positions()[0].y;
    let expected = 1.5 * -10. * dt * dt;
    assert!(((drop - expected) / expected).abs() < 1e-3, "{drop} vs {expected}");
}

#[test]
fn pinned_particles_never_move() {
    init_logger();
    let desc = ClothDesc::from_size(12, 9, Vec2::new(2., 1.5)).draped(-80.);
    let mut sim = CpuSimulation::new(&desc).unwrap();
    let grid = sim.grid();
    let before = sim.positions().to_vec();

    for _ in 0..200 {
        sim.step(1e-4);

        for x in grid.pinned_columns() {
            let idx = grid.index(x, grid.height() - 1);
            assert_eq!(sim.positions()[idx], before[idx]);
            assert_eq!(sim.velocities()[idx], Vec4::ZERO);
        }
    }

    let bottom_middle = grid.index(6, 0);
    assert!(sim.positions()[bottom_middle].y < before[bottom_middle].y);
}

#[test]
fn normals_stay_unit_length() {
    init_logger();
    let desc = ClothDesc::from_size(10, 10, Vec2::new(1., 1.)).draped(-80.);
    let mut sim = CpuSimulation::new(&desc).unwrap();
    for _ in 0..100 {
        sim.step(1e-4);
    }

    for n in sim.normals() {
        let len = n.truncate().length();
        assert!(len == 0. || (len - 1.).abs() < 1e-4, "|n| = {len}");
        assert_eq!(n.w, 0.);
    }
}

#[test]
fn frame_matches_repeated_steps() {
    init_logger();
    let desc = ClothDesc::from_size(8, 6, Vec2::new(1., 1.))
        .draped(-60.)
        .with_substeps(25);

    let mut framed = CpuSimulation::new(&desc).unwrap();
    framed.advance_frame();

    let mut stepped = CpuSimulation::new(&desc).unwrap();
    for _ in 0..25 {
        stepped.step(desc.constants.timestep);
    }

    assert_eq!(framed.steps(), 25);
    assert_eq!(framed.positions(), stepped.positions());
    assert_eq!(framed.velocities(), stepped.velocities());
    assert_eq!(framed.normals(), stepped.normals());
}

#[test]
fn parallel_steps_are_deterministic() {
    init_logger();
    let desc = ClothDesc::from_size(32, 24, Vec2::new(2., 1.5)).draped(-80.);
    let mut a = CpuSimulation::new(&desc).unwrap();
    let mut b = CpuSimulation::new(&desc).unwrap();
    for _ in 0..20 {
        a.step(1e-4);
        b.step(1e-4);
    }
    assert_eq!(a.positions(), b.positions());
    assert_eq!(a.normals(), b.normals());
}

#[test]
fn single_column_has_zero_normals() {
    init_logger();
    let mut sim = CpuSimulation::new(&unit_grid(1, 4)).unwrap();
    sim.step(1e-4);
    assert!(sim.normals().iter().all(|n| *n == Vec4::ZERO));
    assert!(sim.positions().iter().all(|p| p.is_finite()));
}

#[test]
fn rejects_invalid_grids() {
    assert!(matches!(
        CpuSimulation::new(&unit_grid(0, 3)),
        Err(ClothError::EmptyGrid { .. })
    ));
    assert!(matches!(
        CpuSimulation::new(&unit_grid(1, 1)),
        Err(ClothError::NoNeighbors)
    ));
}

#[test]
fn mesh_data_matches_grid() {
    let sim = CpuSimulation::new(&unit_grid(5, 4)).unwrap();
    let grid = sim.grid();
    assert_eq!(mesh::tex_coords(grid).len(), sim.positions().len());

    let indices = mesh::strip_indices(grid);
    assert_eq!(indices.len(), 3 * (2 * 5 + 1));
    assert!(indices
        .iter()
        .all(|&i| i == mesh::PRIMITIVE_RESTART || (i as usize) < grid.len()));
}
