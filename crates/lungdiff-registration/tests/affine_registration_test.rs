use burn::tensor::backend::Backend;
use burn_ndarray::NdArray;
use lungdiff_core::Image;
use lungdiff_core::spatial::{Point, Spacing, Direction};
use lungdiff_registration::{AffineRegistration, AffineRegistrationConfig, StopCondition};

type TestBackend = NdArray<f32>;

/// Gaussian blob on a unit-spaced grid; center given in (x, y, z) voxels.
fn blob(center: [f64; 3], shape: [usize; 3]) -> Image<TestBackend, 3> {
    let device = Default::default();
    let [sz, sy, sx] = shape;
    let mut values = vec![0.0f32; sz * sy * sx];
    for z in 0..sz {
        for y in 0..sy {
            for x in 0..sx {
                let dx = x as f64 - center[0];
                let dy = y as f64 - center[1];
                let dz = z as f64 - center[2];
                let r2 = dx * dx + dy * dy + dz * dz;
                values[z * sy * sx + y * sx + x] = (-r2 / 18.0).exp() as f32 * 100.0;
            }
        }
    }
    Image::from_vec(
        values,
        shape,
        Point::origin(),
        Spacing::uniform(1.0),
        Direction::identity(),
        &device,
    )
}

fn quick_config() -> AffineRegistrationConfig {
    AffineRegistrationConfig {
        shrink_factors: [2, 2, 2],
        smoothing_variance: 1.0,
        sample_fraction: 0.2,
        max_step: 0.05,
        min_step: 0.005,
        max_iterations: 20,
        default_pixel_value: 0.0,
    }
}

#[test]
fn recovers_known_translation() {
    TestBackend::seed(42);

    let fixed = blob([10.0, 8.0, 8.0], [16, 16, 24]);
    let moving = blob([15.0, 8.0, 8.0], [16, 16, 24]);

    let registration = AffineRegistration::new(quick_config());
    let (transform, registered, result) = registration.run(&fixed, &moving).unwrap();

    // Moments initialization carries most of the 5-voxel x offset; the
    // optimizer must not wander far from it
    assert!(
        (transform.translation()[0] - 5.0).abs() < 1.5,
        "translation {:?}",
        transform.translation()
    );
    assert!(transform.translation()[1].abs() < 1.5);
    assert!(transform.translation()[2].abs() < 1.5);

    assert!(result.metric_value.is_finite());
    assert!(result.iterations >= 1);
    assert!(registered.same_grid(&fixed));
}

#[test]
fn self_registration_stays_near_identity() {
    TestBackend::seed(7);

    let fixed = blob([8.0, 8.0, 8.0], [16, 16, 16]);

    let registration = AffineRegistration::new(quick_config());
    let (transform, registered, result) = registration.run(&fixed, &fixed.clone()).unwrap();

    for r in 0..3 {
        for c in 0..3 {
            let expected = if r == c { 1.0 } else { 0.0 };
            assert!(
                (transform.matrix()[(r, c)] - expected).abs() < 0.3,
                "matrix {:?}",
                transform.matrix()
            );
        }
        assert!(transform.translation()[r].abs() < 1.0);
    }

    assert!(matches!(
        result.stop_condition,
        Some(StopCondition::MaxIterations)
            | Some(StopCondition::StepTooSmall)
            | Some(StopCondition::GradientTooSmall)
    ));
    assert!(registered.same_grid(&fixed));
}

#[test]
fn rejects_invalid_configuration() {
    let fixed = blob([4.0, 4.0, 4.0], [8, 8, 8]);
    let config = AffineRegistrationConfig {
        sample_fraction: 2.0,
        ..quick_config()
    };
    let registration = AffineRegistration::new(config);
    assert!(registration.run(&fixed, &fixed.clone()).is_err());
}
