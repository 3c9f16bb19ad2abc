//! CPU package temperature extraction from an OpenHardwareMonitor snapshot.
//! Finds CPU-class hardware nodes and returns the hottest "CPU Package" reading.

use tracing::{debug, warn};

use crate::error::TelemetryError;
use crate::telemetry::types::SensorNode;

pub const TEMPERATURES_GROUP: &str = "Temperatures";
pub const CPU_PACKAGE_SENSOR: &str = "CPU Package";
pub const CPU_ICON_SUFFIX: &str = "cpu.png";
pub const DEFAULT_CPU_KEYWORDS: [&str; 3] = ["cpu", "intel", "amd"];

/// Decides whether a hardware node is a CPU.
/// OHM has no explicit hardware-type field in `data.json`, so this is a heuristic;
/// swap the implementation for boards that name their CPUs differently.
pub trait CpuNodePredicate: Send + Sync {
    fn is_cpu(&self, hardware: &SensorNode) -> bool;
}

impl<F> CpuNodePredicate for F
where
    F: Fn(&SensorNode) -> bool + Send + Sync,
{
    fn is_cpu(&self, hardware: &SensorNode) -> bool {
        self(hardware)
    }
}

/// Label contains one of `keywords` (any case), or `ImageURL` ends with `icon_suffix`.
/// Defaults: "cpu", "intel", "amd" and `cpu.png`.
#[derive(Debug, Clone)]
pub struct NameOrIconHeuristic {
    keywords: Vec<String>,
    icon_suffix: String,
}

impl NameOrIconHeuristic {
    pub fn new(keywords: &[String], icon_suffix: &str) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            icon_suffix: icon_suffix.to_string(),
        }
    }
}

impl Default for NameOrIconHeuristic {
    fn default() -> Self {
        Self::new(&DEFAULT_CPU_KEYWORDS.map(String::from), CPU_ICON_SUFFIX)
    }
}

impl CpuNodePredicate for NameOrIconHeuristic {
    fn is_cpu(&self, hardware: &SensorNode) -> bool {
        let label = hardware.text.to_lowercase();
        self.keywords.iter().any(|k| label.contains(k.as_str()))
            || (!self.icon_suffix.is_empty() && hardware.image_url.ends_with(&self.icon_suffix))
    }
}

/// Hardware nodes under the computer node (`root.Children[0].Children`).
pub fn hardware_nodes(root: &SensorNode) -> Result<&[SensorNode], TelemetryError> {
    let computer = root.children.first().ok_or_else(|| {
        TelemetryError::Decode("top-level Children missing or empty".to_string())
    })?;

    if computer.children.is_empty() {
        return Err(TelemetryError::Decode(format!(
            "computer node '{}' has no hardware Children",
            computer.text
        )));
    }

    Ok(&computer.children)
}

/// Numeric prefix of a sensor value: `"45.0 °C"` -> `45.0`.
pub fn parse_sensor_value(value: &serde_json::Value) -> Option<f64> {
    value
        .as_str()?
        .split_whitespace()
        .next()?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// First parsable "CPU Package" reading of each `Temperatures` group of one
/// hardware node; the hottest group wins.
fn package_temp(hardware: &SensorNode) -> Option<f64> {
    hardware
        .children
        .iter()
        .filter(|group| group.text == TEMPERATURES_GROUP)
        .filter_map(|group| first_package_reading(group, &hardware.text))
        .reduce(f64::max)
}

fn first_package_reading(group: &SensorNode, hardware: &str) -> Option<f64> {
    let sensors = group
        .children
        .iter()
        .filter(|sensor| sensor.text == CPU_PACKAGE_SENSOR);

    for sensor in sensors {
        let Some(raw) = sensor.value.as_ref() else {
            continue;
        };
        match parse_sensor_value(raw) {
            Some(temp) => return Some(temp),
            None => warn!("Failed to parse CPU Package temperature '{}' from '{}'", raw, hardware),
        }
    }

    None
}

/// Maximum "CPU Package" temperature across every CPU-class hardware node.
pub fn max_cpu_package_temp(
    root: &SensorNode,
    predicate: &dyn CpuNodePredicate,
) -> Result<f64, TelemetryError> {
    let temps: Vec<f64> = hardware_nodes(root)?
        .iter()
        .filter(|hw| predicate.is_cpu(hw))
        .filter_map(|hw| {
            let temp = package_temp(hw)?;
            debug!("CPU Package {:.1}°C on '{}'", temp, hw.text);
            Some(temp)
        })
        .collect();

    temps
        .into_iter()
        .reduce(f64::max)
        .ok_or(TelemetryError::SensorNotFound)
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn heuristic_matches_label_or_icon() {
        let h = NameOrIconHeuristic::default();
        assert!(h.is_cpu(&SensorNode::new("Intel Core i7-8700K")));
        assert!(h.is_cpu(&SensorNode::new("AMD Ryzen 9 5950X")));
        assert!(h.is_cpu(&SensorNode::new("Generic CPU")));
        assert!(h.is_cpu(&SensorNode::new("Processor").with_image("images_icon/cpu.png")));
        assert!(!h.is_cpu(&SensorNode::new("NVIDIA GeForce RTX 3080").with_image("images_icon/nvidia.png")));
        assert!(!h.is_cpu(&SensorNode::new("Generic Memory")));
    }

    #[test]
    fn configured_keywords_replace_defaults() {
        let h = NameOrIconHeuristic::new(&["Xeon".to_string()], "");
        assert!(h.is_cpu(&SensorNode::new("Genuine XEON Gold 6130")));
        assert!(!h.is_cpu(&SensorNode::new("Intel Core i7").with_image("images_icon/cpu.png")));
    }

    #[test]
    fn takes_max_across_cpus() {
        let root = cpu_snapshot(&[52.0, 67.5]);
        assert_eq!(max_cpu_package_temp(&root, &NameOrIconHeuristic::default()).unwrap(), 67.5);
    }

    #[test]
    fn ignores_non_cpu_hardware() {
        let gpu = SensorNode::new("NVIDIA GeForce GTX 1080").with_children(vec![
            SensorNode::new(TEMPERATURES_GROUP)
                .with_children(vec![SensorNode::new(CPU_PACKAGE_SENSOR).with_value("99.0 °C")]),
        ]);
        let root = snapshot(vec![gpu, cpu("Intel Core i5", "48.0 °C")]);
        assert_eq!(max_cpu_package_temp(&root, &NameOrIconHeuristic::default()).unwrap(), 48.0);
    }

    #[test]
    fn unparsable_value_is_skipped() {
        let root = snapshot(vec![cpu("Intel #0", "n/a"), cpu("Intel #1", "55.0 °C")]);
        assert_eq!(max_cpu_package_temp(&root, &NameOrIconHeuristic::default()).unwrap(), 55.0);
    }

    #[test]
    fn each_temperature_group_contributes_its_first_package_reading() {
        let group = |readings: &[&str]| {
            SensorNode::new(TEMPERATURES_GROUP).with_children(
                readings
                    .iter()
                    .map(|r| SensorNode::new(CPU_PACKAGE_SENSOR).with_value(*r))
                    .collect(),
            )
        };
        let dual_die = SensorNode::new("AMD Threadripper")
            .with_children(vec![group(&["58.0 °C", "90.0 °C"]), group(&["63.5 °C"])]);
        let root = snapshot(vec![dual_die]);
        assert_eq!(max_cpu_package_temp(&root, &NameOrIconHeuristic::default()).unwrap(), 63.5);
    }

    #[test]
    fn non_string_value_is_skipped() {
        let mut broken = cpu("AMD EPYC", "0");
        broken.children[1].children[1].value = Some(serde_json::json!(61.0));
        let root = snapshot(vec![broken]);
        assert!(matches!(
            max_cpu_package_temp(&root, &NameOrIconHeuristic::default()),
            Err(TelemetryError::SensorNotFound)
        ));
    }

    #[test]
    fn no_package_sensor_is_sensor_not_found() {
        let root = snapshot(vec![SensorNode::new("Intel Core i3")]);
        assert!(matches!(
            max_cpu_package_temp(&root, &NameOrIconHeuristic::default()),
            Err(TelemetryError::SensorNotFound)
        ));
    }

    #[test]
    fn malformed_shape_is_decode_error() {
        let empty = SensorNode::new("Sensor");
        assert!(matches!(
            max_cpu_package_temp(&empty, &NameOrIconHeuristic::default()),
            Err(TelemetryError::Decode(_))
        ));

        let bare_computer = SensorNode::new("Sensor").with_children(vec![SensorNode::new("PC")]);
        assert!(matches!(
            max_cpu_package_temp(&bare_computer, &NameOrIconHeuristic::default()),
            Err(TelemetryError::Decode(_))
        ));
    }

    #[test]
    fn custom_predicate_replaces_heuristic() {
        let root = snapshot(vec![cpu("Socket 0", "44.0 °C"), cpu("Socket 1", "58.0 °C")]);
        let only_socket_zero = |hw: &SensorNode| hw.text == "Socket 0";
        assert_eq!(max_cpu_package_temp(&root, &only_socket_zero).unwrap(), 44.0);
    }

    #[test]
    fn parses_real_ohm_document() {
        let json = r#"{
            "id": 0, "Text": "Sensor", "Min": "Min", "Value": "Value", "Max": "Max", "ImageURL": "",
            "Children": [{
                "id": 1, "Text": "SERVER", "ImageURL": "images_icon/computer.png", "Value": "",
                "Children": [
                    {"id": 2, "Text": "Intel Xeon E5-2670 v2", "ImageURL": "images_icon/cpu.png", "Value": "",
                     "Children": [{"id": 3, "Text": "Temperatures", "ImageURL": "images_icon/temperature.png", "Value": "",
                        "Children": [
                            {"id": 4, "Text": "CPU Core #1", "Min": "40.0 °C", "Value": "43.0 °C", "Max": "70.0 °C", "ImageURL": "images/transparent.png", "Children": []},
                            {"id": 5, "Text": "CPU Package", "Min": "45.0 °C", "Value": "62.0 °C", "Max": "79.0 °C", "ImageURL": "images/transparent.png", "Children": []}
                        ]}]},
                    {"id": 6, "Text": "Generic Memory", "ImageURL": "images_icon/ram.png", "Value": "", "Children": []}
                ]
            }]
        }"#;
        let root: SensorNode = serde_json::from_str(json).unwrap();
        assert_eq!(max_cpu_package_temp(&root, &NameOrIconHeuristic::default()).unwrap(), 62.0);
    }
}
