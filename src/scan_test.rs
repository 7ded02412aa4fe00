use crate::config::Table;
use crate::scan::{self, format_value, linspace, ScanErrors};
use toml::Value;

fn base(scan_section: &str) -> Table {
    format!(
        r#"
[job]
name = "bii"

[script]
n_gaps = 4

{scan_section}
"#
    )
    .parse()
    .unwrap()
}

#[test]
pub fn linspace_is_inclusive() {
    let samples = linspace(0.1, 0.5, 5);
    let expected = [0.1, 0.2, 0.3, 0.4, 0.5];

    assert_eq!(samples.len(), expected.len());
    for (sample, reference) in samples.iter().zip(expected) {
        assert!((sample - reference).abs() < 1e-12);
    }
}

#[test]
pub fn linspace_single_sample_is_start() {
    assert_eq!(linspace(0.3, 0.9, 1), vec![0.3]);
}

#[test]
pub fn grid_size_is_product_of_value_counts() {
    let config = base(
        "[scan]\nion_mass = [1, 28, 44]\ncurrent = { start = 0.1, stop = 0.5, num = 4 }",
    );

    assert_eq!(scan::expand(&config).unwrap().len(), 12);
}

#[test]
pub fn missing_scan_section_yields_single_job() {
    let config = base("");
    let points = scan::expand(&config).unwrap();

    assert_eq!(points.len(), 1);
    assert_eq!(points[0].name, "bii");
    assert!(points[0].values.is_empty());
}

#[test]
pub fn names_are_pairwise_distinct() {
    let config = base("[scan]\nion_mass = [1, 28, 44]\nn_gaps = [1, 2, 4, 8]");
    let points = scan::expand(&config).unwrap();

    for (index, point) in points.iter().enumerate() {
        assert!(
            !points[..index].iter().any(|other| other.name == point.name),
            "duplicate job name {}",
            point.name
        );
    }
}

#[test]
pub fn first_declared_key_varies_slowest() {
    let config = base("[scan]\na = [1, 2]\nb = [10, 20]");
    let names: Vec<String> = scan::expand(&config)
        .unwrap()
        .into_iter()
        .map(|point| point.name)
        .collect();

    assert_eq!(
        names,
        vec!["bii_a_1_b_10", "bii_a_1_b_20", "bii_a_2_b_10", "bii_a_2_b_20"]
    );
}

#[test]
pub fn grid_points_rewrite_script_and_job_name() {
    let config = base("[scan]\nion_mass = [28]");
    let points = scan::expand(&config).unwrap();
    let point = &points[0];

    assert_eq!(point.name, "bii_ion_mass_28");
    assert!(point.config.get("scan").is_none());

    let script = point.config.get("script").unwrap().as_table().unwrap();
    assert_eq!(script.get("ion_mass").unwrap().as_integer(), Some(28));
    // untouched script keys survive
    assert_eq!(script.get("n_gaps").unwrap().as_integer(), Some(4));

    let job = point.config.get("job").unwrap().as_table().unwrap();
    assert_eq!(job.get("name").unwrap().as_str(), Some("bii_ion_mass_28"));
}

#[test]
pub fn float_formatting_thresholds() {
    assert_eq!(format_value(&Value::Float(2.5)), "2.5");
    assert_eq!(format_value(&Value::Float(12.0)), "12.0");
    assert_eq!(format_value(&Value::Float(0.5)), "0.500");
    assert_eq!(format_value(&Value::Float(0.1234)), "0.123");
    assert_eq!(format_value(&Value::Integer(28)), "28");
    assert_eq!(format_value(&Value::Boolean(true)), "true");
    assert_eq!(format_value(&Value::String("weak".to_string())), "weak");
}

#[test]
pub fn duplicate_scan_values_are_rejected() {
    let config = base("[scan]\nion_mass = [28, 28]");

    assert!(matches!(
        scan::expand(&config),
        Err(ScanErrors::DuplicateValue { .. })
    ));
}

#[test]
pub fn empty_value_list_is_invalid() {
    let config = base("[scan]\nion_mass = []");

    assert!(matches!(
        scan::expand(&config),
        Err(ScanErrors::InvalidSpec { .. })
    ));
}

#[test]
pub fn zero_sample_range_is_invalid() {
    let config = base("[scan]\ncurrent = { start = 0.1, stop = 0.5, num = 0 }");

    assert!(matches!(
        scan::expand(&config),
        Err(ScanErrors::InvalidSpec { .. })
    ));
}

#[test]
pub fn bare_scalar_is_a_one_element_list() {
    let config = base("[scan]\nion_mass = 28");
    let points = scan::expand(&config).unwrap();

    assert_eq!(points.len(), 1);
    assert_eq!(points[0].name, "bii_ion_mass_28");
}

#[test]
pub fn range_values_are_linspace_samples() {
    let config = base("[scan]\ncurrent = { start = 0.1, stop = 0.5, num = 5 }");
    let points = scan::expand(&config).unwrap();

    assert_eq!(points.len(), 5);
    assert_eq!(points[0].name, "bii_current_0.100");
    assert_eq!(points[4].name, "bii_current_0.500");
}
