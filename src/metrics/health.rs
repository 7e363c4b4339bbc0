//! Composite health score.
//!
//! Starts at 100 and deducts per pollutant from stepped severity tables
//! evaluated against the latest reading. The default tables are the
//! reference breakpoints; they are exposed as configuration so deployments
//! can tune them without code changes.

use serde::{Deserialize, Serialize};

use crate::models::Reading;

pub const MAX_HEALTH_SCORE: u8 = 100;

/// Largest single deduction a table may configure.
pub const MAX_DEDUCTION: u32 = MAX_HEALTH_SCORE as u32;

/// Deduct `deduction` for values at or below `up_to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityStep {
    pub up_to: f64,
    pub deduction: u32,
}

/// Ordered steps plus the deduction for values above the last step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityTable {
    pub steps: Vec<SeverityStep>,
    pub beyond: u32,
}

impl SeverityTable {
    pub fn new(steps: &[(f64, u32)], beyond: u32) -> Self {
        Self {
            steps: steps
                .iter()
                .map(|&(up_to, deduction)| SeverityStep { up_to, deduction })
                .collect(),
            beyond,
        }
    }

    pub fn deduction(&self, value: f64) -> u32 {
        self.steps
            .iter()
            .find(|step| value <= step.up_to)
            .map(|step| step.deduction)
            .unwrap_or(self.beyond)
    }

    /// Breakpoints must increase strictly and deductions must not decrease,
    /// otherwise the score would stop being monotonic in severity.
    pub fn validate(&self, name: &str) -> Result<(), String> {
        for pair in self.steps.windows(2) {
            if !(pair[0].up_to < pair[1].up_to) {
                return Err(format!("{} breakpoints must be strictly increasing", name));
            }
            if pair[0].deduction > pair[1].deduction {
                return Err(format!("{} deductions must not decrease", name));
            }
        }
        if let Some(last) = self.steps.last() {
            if last.deduction > self.beyond {
                return Err(format!("{} beyond deduction is below the last step", name));
            }
        }
        if self.beyond > MAX_DEDUCTION {
            return Err(format!("{} deductions must not exceed {}", name, MAX_DEDUCTION));
        }
        Ok(())
    }
}

/// Deduction for humidity outside a comfortable band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumidityRule {
    pub comfortable_min: f64,
    pub comfortable_max: f64,
    pub mild_deduction: u32,
    /// Distance outside the band beyond which `severe_deduction` applies.
    pub severe_margin: f64,
    pub severe_deduction: u32,
}

impl HumidityRule {
    pub fn deduction(&self, humidity: f64) -> u32 {
        let distance = if humidity < self.comfortable_min {
            self.comfortable_min - humidity
        } else if humidity > self.comfortable_max {
            humidity - self.comfortable_max
        } else {
            return 0;
        };

        if distance > self.severe_margin {
            self.severe_deduction
        } else {
            self.mild_deduction
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthBreakpoints {
    pub pm25: SeverityTable,
    pub pm10: SeverityTable,
    pub humidity: HumidityRule,
    pub noise: SeverityTable,
}

impl Default for HealthBreakpoints {
    fn default() -> Self {
        Self {
            pm25: SeverityTable::new(&[(5.0, 0), (12.0, 10), (35.0, 25), (55.0, 40)], 50),
            pm10: SeverityTable::new(&[(15.0, 0), (54.0, 10), (154.0, 20), (250.0, 30)], 40),
            humidity: HumidityRule {
                comfortable_min: 20.0,
                comfortable_max: 80.0,
                mild_deduction: 5,
                severe_margin: 10.0,
                severe_deduction: 10,
            },
            noise: SeverityTable::new(&[(40.0, 0), (55.0, 3), (70.0, 8), (85.0, 12)], 15),
        }
    }
}

impl HealthBreakpoints {
    pub fn validate(&self) -> Result<(), String> {
        self.pm25.validate("health.pm25")?;
        self.pm10.validate("health.pm10")?;
        self.noise.validate("health.noise")?;
        if self.humidity.comfortable_min > self.humidity.comfortable_max {
            return Err("health.humidity band is inverted".to_string());
        }
        if self.humidity.mild_deduction > self.humidity.severe_deduction {
            return Err("health.humidity mild deduction exceeds severe".to_string());
        }
        if self.humidity.severe_deduction > MAX_DEDUCTION {
            return Err(format!("health.humidity deductions must not exceed {}", MAX_DEDUCTION));
        }
        Ok(())
    }
}

/// Overall condition band derived from a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Excellent,
    Good,
    Moderate,
    Poor,
    Hazardous,
}

impl Category {
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => Category::Excellent,
            60..=79 => Category::Good,
            40..=59 => Category::Moderate,
            20..=39 => Category::Poor,
            _ => Category::Hazardous,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "excellent" => Some(Category::Excellent),
            "good" => Some(Category::Good),
            "moderate" | "fair" => Some(Category::Moderate),
            "poor" | "unhealthy" => Some(Category::Poor),
            "hazardous" | "very poor" => Some(Category::Hazardous),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Excellent => "Excellent",
            Category::Good => "Good",
            Category::Moderate => "Moderate",
            Category::Poor => "Poor",
            Category::Hazardous => "Hazardous",
        }
    }
}

/// Integer score in 0..=100; higher is healthier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HealthScore(u8);

impl HealthScore {
    pub fn new(value: u32) -> Self {
        Self(value.min(MAX_HEALTH_SCORE as u32) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn category(&self) -> Category {
        Category::from_score(self.0)
    }
}

/// Score the latest reading. No reading, or no pollutant values, scores 100.
pub fn health_score(latest: Option<&Reading>, breakpoints: &HealthBreakpoints) -> HealthScore {
    let Some(reading) = latest else {
        return HealthScore::new(MAX_HEALTH_SCORE as u32);
    };

    let deductions = [
        reading.pm25.map_or(0, |v| breakpoints.pm25.deduction(v)),
        reading.pm10.map_or(0, |v| breakpoints.pm10.deduction(v)),
        reading.humidity.map_or(0, |v| breakpoints.humidity.deduction(v)),
        reading.noise.map_or(0, |v| breakpoints.noise.deduction(v)),
    ]
    .into_iter()
    .fold(0u32, u32::saturating_add);

    HealthScore::new((MAX_HEALTH_SCORE as u32).saturating_sub(deductions))
}
