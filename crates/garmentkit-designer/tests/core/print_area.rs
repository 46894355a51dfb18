use garmentkit_core::Side;
use garmentkit_designer::PrintAreaCalculator;
use garmentkit_settings::Config;
use proptest::prelude::*;

#[test]
fn test_men_print_area_on_default_canvas() {
    let calculator = PrintAreaCalculator::new(&Config::default());
    let area = calculator
        .compute_fitted_rect(1800.0, 1200.0, "men", Side::Front)
        .unwrap();

    assert!((area.left - 900.0).abs() < 1e-9);
    assert!((area.top - 624.0).abs() < 1e-9);
    assert!((area.width / area.height - 16.0 / 20.0).abs() < 1e-9);
    let (_, top, _, bottom) = area.bounds();
    assert!(top >= 0.0 && bottom <= 1200.0);
}

#[test]
fn test_sides_differ_only_where_overridden() {
    let calculator = PrintAreaCalculator::new(&Config::default());
    let men_front = calculator.compute_fitted_rect(1800.0, 1200.0, "men", Side::Front);
    let men_back = calculator.compute_fitted_rect(1800.0, 1200.0, "men", Side::Back);
    assert_eq!(men_front, men_back);

    let hoodie_front = calculator
        .compute_fitted_rect(1800.0, 1200.0, "hoodie", Side::Front)
        .unwrap();
    let hoodie_back = calculator
        .compute_fitted_rect(1800.0, 1200.0, "hoodie", Side::Back)
        .unwrap();
    assert!(hoodie_front.height < hoodie_back.height);
}

#[test]
fn test_unknown_garment_has_no_area() {
    let calculator = PrintAreaCalculator::new(&Config::default());
    assert!(!calculator.knows("poncho"));
    assert!(calculator
        .compute_fitted_rect(1800.0, 1200.0, "poncho", Side::Front)
        .is_none());
}

proptest! {
    #[test]
    fn prop_area_fits_canvas_and_keeps_aspect(
        width in 1.0f64..4000.0,
        height in 1.0f64..4000.0,
        garment in prop::sample::select(vec!["men", "women", "kids", "hoodie"]),
        back in any::<bool>(),
    ) {
        let config = Config::default();
        let calculator = PrintAreaCalculator::new(&config);
        let side = if back { Side::Back } else { Side::Front };
        let area = calculator.compute_fitted_rect(width, height, garment, side).unwrap();

        prop_assert!(area.width <= width + 1e-9);
        prop_assert!(area.height <= height + 1e-9);

        let size = config.garments[garment].print_area.resolve(side);
        let expected = size.width / size.height;
        prop_assert!((area.width / area.height - expected).abs() < 1e-6);
    }
}
