//! Data Transfer Objects
//!
//! Request and response bodies exchanged with the claims backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// Prediction
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Smoker {
    Yes,
    No,
}

impl Smoker {
    pub fn is_smoker(self) -> bool {
        self == Smoker::Yes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    North,
    South,
    East,
    West,
    #[serde(untagged)]
    Other(String),
}

/// Patient attributes submitted for a claim prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub age: u32,
    pub bmi: f64,
    pub gender: Gender,
    pub smoker: Smoker,
    pub region: Region,
    /// Annual premium in INR; absent means the 25 000 reference premium
    #[serde(default)]
    pub premium_annual_inr: Option<f64>,
}

impl PatientProfile {
    pub const REFERENCE_PREMIUM: f64 = 25_000.0;

    pub fn premium(&self) -> f64 {
        self.premium_annual_inr.unwrap_or(Self::REFERENCE_PREMIUM)
    }

    /// Range checks matching the prediction form
    pub fn validate(&self) -> Result<(), String> {
        if !(18..=100).contains(&self.age) {
            return Err(format!("age must be between 18 and 100, got {}", self.age));
        }
        if !self.bmi.is_finite() || !(10.0..=50.0).contains(&self.bmi) {
            return Err(format!("BMI must be between 10 and 50, got {}", self.bmi));
        }
        if let Some(premium) = self.premium_annual_inr {
            if !premium.is_finite() || premium < 0.0 {
                return Err(format!("premium must be a non-negative amount, got {}", premium));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: f64,
    pub confidence: f64,
    pub input_data: PatientProfile,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub mock: bool,
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

/// Account as reported by `/signup` and `/me`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

// ============================================================================
// Analytics
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardStats {
    pub total_policies: u64,
    pub avg_claim: f64,
    pub avg_premium: f64,
    pub avg_age: f64,
    pub avg_bmi: f64,
    pub smoker_percentage: f64,
    pub regions: BTreeMap<String, u64>,
    pub gender_distribution: BTreeMap<String, u64>,
}

/// Averages of claim and premium per group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupAverages {
    pub claim_amount_inr: BTreeMap<String, f64>,
    pub premium_annual_inr: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionClaims {
    pub mean: BTreeMap<String, f64>,
    pub count: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionAnalysis {
    pub claim_amount_inr: RegionClaims,
    pub premium_annual_inr: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimsAnalysis {
    pub age_groups: GroupAverages,
    pub region_analysis: RegionAnalysis,
    pub smoker_analysis: GroupAverages,
    pub premium_vs_claims: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub status: String,
    #[serde(default)]
    pub test_r2: Option<f64>,
    #[serde(default)]
    pub test_rmse: Option<f64>,
    #[serde(default)]
    pub training_date: Option<String>,
    #[serde(default)]
    pub training_samples: Option<u64>,
    #[serde(default)]
    pub model_type: Option<String>,
}

// ============================================================================
// Email
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionEmailRequest {
    pub email: String,
    pub prediction: PredictionResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailResult {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Admin
// ============================================================================

/// A dataset selected for upload
#[derive(Debug, Clone)]
pub struct DatasetFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl DatasetFile {
    pub const MAX_BYTES: usize = 10 * 1024 * 1024;

    pub fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset.csv".to_string());
        Ok(Self { file_name, bytes })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub dataset_rows: Option<u64>,
    #[serde(default)]
    pub training_completed: Option<bool>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub mock: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrainResult {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub training_time: Option<String>,
    #[serde(default)]
    pub new_accuracy: Option<f64>,
    #[serde(default)]
    pub samples_used: Option<u64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub mock: bool,
}

fn default_true() -> bool {
    true
}
