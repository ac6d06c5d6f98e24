//! Summary statistics over a batch of equipment records.
//!
//! [`summarize`] is a pure function: no I/O, no side effects, identical
//! input always yields identical output. Callers reject empty batches
//! before persistence, so the averages are always well-defined.

use crate::error::{EquipError, Result};
use crate::model::{DatasetStats, Distribution, EquipmentRecord};

/// Compute total count, the three arithmetic means, and the per-type
/// distribution for a batch of records.
///
/// # Errors
///
/// `EmptyDataset` if `records` is empty.
pub fn summarize(records: &[EquipmentRecord]) -> Result<DatasetStats> {
    if records.is_empty() {
        return Err(EquipError::EmptyDataset);
    }

    let mut flowrate_sum = 0.0_f64;
    let mut pressure_sum = 0.0_f64;
    let mut temperature_sum = 0.0_f64;
    let mut distribution = Distribution::new();

    for record in records {
        flowrate_sum += record.flowrate;
        pressure_sum += record.pressure;
        temperature_sum += record.temperature;
        // Exact, case-sensitive type match.
        *distribution
            .entry(record.equipment_type.clone())
            .or_insert(0) += 1;
    }

    let n = records.len() as f64;
    Ok(DatasetStats {
        total_count: records.len(),
        avg_flowrate: flowrate_sum / n,
        avg_pressure: pressure_sum / n,
        avg_temperature: temperature_sum / n,
        distribution,
    })
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used)]
    use super::*;

    fn record(name: &str, kind: &str, flowrate: f64, pressure: f64, temperature: f64) -> EquipmentRecord {
        EquipmentRecord {
            name: name.to_owned(),
            equipment_type: kind.to_owned(),
            flowrate,
            pressure,
            temperature,
        }
    }

    #[test]
    fn test_example_scenario() -> Result<()> {
        let records = vec![
            record("Pump-1", "Pump", 10.0, 2.0, 25.0),
            record("Valve-1", "Valve", 5.0, 1.0, 20.0),
        ];
        let stats = summarize(&records)?;

        assert_eq!(stats.total_count, 2);
        assert_eq!(stats.avg_flowrate, 7.5);
        assert_eq!(stats.avg_pressure, 1.5);
        assert_eq!(stats.avg_temperature, 22.5);
        assert_eq!(stats.distribution.get("Pump"), Some(&1));
        assert_eq!(stats.distribution.get("Valve"), Some(&1));
        Ok(())
    }

    #[test]
    fn test_distribution_counts_sum_to_total() -> Result<()> {
        let records = vec![
            record("A", "Pump", 1.0, 1.0, 1.0),
            record("B", "Pump", 2.0, 2.0, 2.0),
            record("C", "Valve", 3.0, 3.0, 3.0),
            record("D", "Reactor", 4.0, 4.0, 4.0),
        ];
        let stats = summarize(&records)?;

        let counted: u64 = stats.distribution.values().sum();
        assert_eq!(counted as usize, stats.total_count);
        assert_eq!(stats.total_count, records.len());
        assert_eq!(stats.distribution.len(), 3);
        Ok(())
    }

    #[test]
    fn test_mean_within_tolerance() -> Result<()> {
        let records: Vec<EquipmentRecord> = (1..=1000)
            .map(|i| record(&format!("E-{i}"), "Pump", i as f64, 0.5, -10.0))
            .collect();
        let stats = summarize(&records)?;

        let expected = 1000.0 * 1001.0 / 2.0 / 1000.0;
        assert!((stats.avg_flowrate - expected).abs() / expected < 1e-9);
        assert!((stats.avg_pressure - 0.5).abs() < 1e-12);
        assert!((stats.avg_temperature - -10.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_type_match_is_case_sensitive() -> Result<()> {
        let records = vec![
            record("A", "pump", 1.0, 1.0, 1.0),
            record("B", "Pump", 1.0, 1.0, 1.0),
        ];
        let stats = summarize(&records)?;
        assert_eq!(stats.distribution.len(), 2);
        Ok(())
    }

    #[test]
    fn test_empty_batch_rejected() {
        let err = summarize(&[]).unwrap_err();
        assert!(matches!(err, EquipError::EmptyDataset));
    }

    #[test]
    fn test_pure_and_deterministic() -> Result<()> {
        let records = vec![
            record("A", "Pump", 1.25, 3.5, 7.0),
            record("B", "Valve", 2.75, 1.5, 9.0),
        ];
        let first = summarize(&records)?;
        let second = summarize(&records)?;
        assert_eq!(first, second);
        Ok(())
    }
}
