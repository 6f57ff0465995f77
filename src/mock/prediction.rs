//! Deterministic claim estimate
//!
//! Used whenever the prediction service cannot answer. The estimate is a
//! pure function of the profile so the same input always shows the same
//! number.

use crate::api::dto::{Gender, PatientProfile, PredictionResult, Region};

const BASE_CLAIM_INR: f64 = 15_000.0;

/// Half of the estimate scales with the premium, so a zero premium still
/// leaves a positive claim
fn premium_scale(profile: &PatientProfile) -> f64 {
    0.5 + 0.5 * profile.premium() / PatientProfile::REFERENCE_PREMIUM
}

/// Multiplier in [0.85, 1.15] derived from the profile
pub fn variation_factor(profile: &PatientProfile) -> f64 {
    let hash = f64::from(profile.age)
        + profile.bmi * 10.0
        + if profile.gender == Gender::Male { 100.0 } else { 200.0 }
        + if profile.smoker.is_smoker() { 1000.0 } else { 0.0 }
        + profile.premium();

    0.85 + ((hash % 100.0) / 100.0) * 0.3
}

fn region_multiplier(region: &Region) -> f64 {
    match region {
        Region::North => 1.1,
        Region::South => 0.9,
        Region::East => 0.95,
        Region::West => 1.15,
        Region::Other(_) => 1.0,
    }
}

/// Confidence in [0.65, 0.95]
pub fn mock_confidence(profile: &PatientProfile) -> f64 {
    let mut confidence: f64 = 0.85;
    if profile.age > 60 {
        confidence -= 0.05;
    }
    if profile.bmi < 18.5 || profile.bmi > 35.0 {
        confidence -= 0.03;
    }
    if profile.smoker.is_smoker() {
        confidence -= 0.02;
    }
    confidence.clamp(0.65, 0.95)
}

pub fn compute_mock(profile: &PatientProfile) -> PredictionResult {
    let mut claim = BASE_CLAIM_INR;

    if profile.age > 50 {
        claim *= 1.5;
    } else if profile.age > 35 {
        claim *= 1.2;
    }

    if profile.bmi > 30.0 {
        claim *= 1.3;
    } else if profile.bmi < 18.5 {
        claim *= 1.1;
    }

    if profile.smoker.is_smoker() {
        claim *= 1.8;
    }

    claim *= region_multiplier(&profile.region);
    claim *= premium_scale(profile);
    claim *= variation_factor(profile);

    PredictionResult {
        prediction: claim.round(),
        confidence: mock_confidence(profile),
        input_data: profile.clone(),
        mock: true,
    }
}
