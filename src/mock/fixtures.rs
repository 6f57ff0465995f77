//! Offline fixtures for analytics and admin operations

use std::collections::BTreeMap;

use super::FallbackReason;
use crate::api::dto::{
    ClaimsAnalysis, DashboardStats, GroupAverages, ModelInfo, RegionAnalysis, RegionClaims,
    RetrainResult, UploadResult,
};

fn map<V: Copy>(entries: &[(&str, V)]) -> BTreeMap<String, V> {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

pub fn mock_stats() -> DashboardStats {
    DashboardStats {
        total_policies: 1000,
        avg_claim: 23_150.0,
        avg_premium: 27_400.0,
        avg_age: 41.2,
        avg_bmi: 28.6,
        smoker_percentage: 21.5,
        regions: map(&[("East", 240), ("North", 262), ("South", 231), ("West", 267)]),
        gender_distribution: map(&[("Female", 492), ("Male", 508)]),
    }
}

pub fn mock_claims_analysis() -> ClaimsAnalysis {
    ClaimsAnalysis {
        age_groups: GroupAverages {
            claim_amount_inr: map(&[
                ("18-30", 14_800.0),
                ("31-45", 19_900.0),
                ("46-60", 27_300.0),
                ("60+", 34_600.0),
            ]),
            premium_annual_inr: map(&[
                ("18-30", 21_500.0),
                ("31-45", 25_800.0),
                ("46-60", 30_900.0),
                ("60+", 36_200.0),
            ]),
        },
        region_analysis: RegionAnalysis {
            claim_amount_inr: RegionClaims {
                mean: map(&[
                    ("East", 21_700.0),
                    ("North", 24_100.0),
                    ("South", 20_300.0),
                    ("West", 26_400.0),
                ]),
                count: map(&[("East", 240), ("North", 262), ("South", 231), ("West", 267)]),
            },
            premium_annual_inr: map(&[
                ("East", 26_200.0),
                ("North", 27_900.0),
                ("South", 25_600.0),
                ("West", 29_700.0),
            ]),
        },
        smoker_analysis: GroupAverages {
            claim_amount_inr: map(&[("No", 18_900.0), ("Yes", 38_700.0)]),
            premium_annual_inr: map(&[("No", 25_100.0), ("Yes", 35_800.0)]),
        },
        premium_vs_claims: map(&[
            ("<20k", 13_600.0),
            ("20k-30k", 20_800.0),
            ("30k-40k", 28_900.0),
            ("40k+", 37_500.0),
        ]),
    }
}

pub fn mock_model_info() -> ModelInfo {
    ModelInfo {
        status: "Model loaded".to_string(),
        test_r2: Some(0.92),
        test_rmse: Some(3500.0),
        training_date: Some("2024-09-30".to_string()),
        training_samples: Some(1000),
        model_type: Some("Random Forest Regressor".to_string()),
    }
}

/// `rows` is the data row count of the validated file
pub fn demo_upload(file_name: &str, size: u64, rows: u64, reason: FallbackReason) -> UploadResult {
    match reason {
        FallbackReason::DemoAccount => UploadResult {
            success: true,
            message: format!(
                "Demo: File \"{}\" uploaded successfully! Model retrained with {} samples.",
                file_name, rows
            ),
            filename: Some(file_name.to_string()),
            size: Some(size),
            dataset_rows: Some(rows),
            training_completed: Some(true),
            mock: true,
        },
        FallbackReason::BackendUnavailable => UploadResult {
            success: true,
            message: format!(
                "Demo: File \"{}\" upload simulated successfully! Backend unavailable - this is a demo response.",
                file_name
            ),
            filename: Some(file_name.to_string()),
            size: Some(size),
            dataset_rows: None,
            training_completed: None,
            mock: true,
        },
    }
}

const RETRAIN_SEED: &[u8] = b"claimsight-demo-retrain";

pub fn demo_retrain(reason: FallbackReason) -> RetrainResult {
    match reason {
        FallbackReason::DemoAccount => {
            let seed = crc32fast::hash(RETRAIN_SEED);
            RetrainResult {
                success: true,
                message: "Demo: Model retrained successfully! Training completed with improved accuracy."
                    .to_string(),
                training_time: Some("3 seconds (simulated)".to_string()),
                new_accuracy: Some(0.94 + f64::from(seed % 50) / 1000.0),
                samples_used: Some(800 + u64::from(seed % 500)),
                mock: true,
            }
        }
        FallbackReason::BackendUnavailable => RetrainResult {
            success: true,
            message: "Demo: Model retraining simulated successfully! Backend unavailable - this is a demo response."
                .to_string(),
            training_time: Some("2-3 minutes (simulated)".to_string()),
            new_accuracy: Some(0.93),
            samples_used: None,
            mock: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_are_consistent() {
        let stats = mock_stats();
        assert_eq!(stats.regions.values().sum::<u64>(), stats.total_policies);
        assert_eq!(
            stats.gender_distribution.values().sum::<u64>(),
            stats.total_policies
        );
    }

    #[test]
    fn test_analysis_region_counts_match_stats() {
        let analysis = mock_claims_analysis();
        assert_eq!(analysis.region_analysis.claim_amount_inr.count, mock_stats().regions);
        assert_eq!(analysis.age_groups.claim_amount_inr.len(), 4);
    }

    #[test]
    fn test_model_info() {
        let info = mock_model_info();
        assert_eq!(info.status, "Model loaded");
        assert_eq!(info.test_r2, Some(0.92));
        assert_eq!(info.training_samples, Some(1000));
    }

    #[test]
    fn test_demo_upload_variants() {
        let demo = demo_upload("claims.csv", 2048, 2, FallbackReason::DemoAccount);
        assert!(demo.mock);
        assert_eq!(demo.dataset_rows, Some(2));
        assert!(demo.message.contains("with 2 samples"));
        assert_eq!(demo.training_completed, Some(true));
        assert!(demo.message.contains("\"claims.csv\""));

        let offline = demo_upload("claims.csv", 2048, 2, FallbackReason::BackendUnavailable);
        assert!(offline.mock);
        assert!(offline.dataset_rows.is_none());
        assert!(offline.message.contains("Backend unavailable"));
    }

    #[test]
    fn test_demo_retrain_is_fixed() {
        assert_eq!(
            demo_retrain(FallbackReason::DemoAccount),
            demo_retrain(FallbackReason::DemoAccount)
        );
        let accuracy = demo_retrain(FallbackReason::DemoAccount).new_accuracy.unwrap();
        assert!((0.94..0.99).contains(&accuracy));

        let offline = demo_retrain(FallbackReason::BackendUnavailable);
        assert_eq!(offline.new_accuracy, Some(0.93));
        assert_eq!(offline.training_time.as_deref(), Some("2-3 minutes (simulated)"));
    }
}
