use burn_ndarray::NdArray;
use lungdiff_core::Image;
use lungdiff_core::spatial::{Point, Spacing, Direction};
use lungdiff_registration::{DemonsRegistration, DemonsRegistrationConfig};

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
                values[z * sy * sx + y * sx + x] = (-r2 / 10.0).exp() as f32 * 100.0;
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

fn mse(a: &Image<TestBackend, 3>, b: &Image<TestBackend, 3>) -> f64 {
    let av = a.to_vec();
    let bv = b.to_vec();
    av.iter()
        .zip(bv.iter())
        .map(|(x, y)| ((x - y) as f64).powi(2))
        .sum::<f64>()
        / av.len() as f64
}

#[test]
fn small_shift_improves_alignment() {
    let fixed = blob([8.0, 8.0, 8.0], [16, 16, 16]);
    let moving = blob([9.0, 8.0, 8.0], [16, 16, 16]);

    let config = DemonsRegistrationConfig {
        shrink_factors: [1, 1, 1],
        iterations: 15,
        smoothing_sigma: 1.0,
        histogram_levels: 64,
        match_points: 16,
    };
    let demons = DemonsRegistration::new(config);

    let mut history = Vec::new();
    let (field, warped, result) = demons
        .run(&fixed, &moving, |_, metric| history.push(metric))
        .unwrap();

    assert_eq!(history.len(), 15);
    assert_eq!(result.iterations, 15);
    assert!(*history.last().unwrap() < history[0]);

    // The warped moving image must sit closer to the fixed image
    assert!(mse(&fixed, &warped) < mse(&fixed, &moving));
    assert_eq!(field.shape(), fixed.shape());
    assert!(field.max_magnitude() > 0.0);
}

#[test]
fn shrunken_field_is_upsampled_to_the_fixed_grid() {
    let fixed = blob([8.0, 8.0, 4.0], [8, 16, 16]);
    let moving = blob([9.0, 8.0, 4.0], [8, 16, 16]);

    let config = DemonsRegistrationConfig {
        shrink_factors: [2, 2, 1],
        iterations: 5,
        smoothing_sigma: 1.0,
        histogram_levels: 64,
        match_points: 16,
    };
    let demons = DemonsRegistration::new(config);

    let (field, warped, _) = demons.run(&fixed, &moving, |_, _| {}).unwrap();

    // Field and warped output live at the full fixed resolution
    assert_eq!(field.shape(), [8, 16, 16]);
    assert!(warped.same_grid(&fixed));
}

#[test]
fn rejects_invalid_configuration() {
    let fixed = blob([4.0, 4.0, 4.0], [8, 8, 8]);
    let config = DemonsRegistrationConfig {
        iterations: 0,
        ..Default::default()
    };
    let demons = DemonsRegistration::new(config);
    assert!(demons.run(&fixed, &fixed.clone(), |_, _| {}).is_err());
}
