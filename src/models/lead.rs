use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A prospective creator captured by one of the marketing forms
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Lead {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub instagram: String,
    pub phone: String,
    pub niche_category: String,
    pub experience_level: String,
    pub city: String,
    pub followers: String,
    /// Rate as the creator typed it, or the calculator's average
    pub quote_price: String,
    pub created_at: DateTime<Utc>,
}

/// Values written by a single lead insert
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewLead {
    pub name: String,
    pub email: String,
    pub instagram: String,
    pub phone: String,
    pub niche_category: String,
    pub experience_level: String,
    pub city: String,
    pub followers: String,
    pub quote_price: String,
}

/// Landing page application form; every field is required
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LeadSubmission {
    pub name: String,
    pub email: String,
    pub instagram: String,
    pub phone: String,
    pub quote_price: String,
    pub niche_category: String,
    pub experience_level: String,
    pub city: String,
    pub followers: String,
}

/// Contact details collected before a quote is downloaded
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuoteContact {
    pub name: String,
    pub email: String,
    pub instagram: String,
    pub phone: String,
}

/// The two follow-up questions shown after a download
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SurveyAnswers {
    pub email: String,
    pub niche_category: String,
    pub experience_level: String,
}

/// A user-facing message for input that was rejected before touching the store
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(msg: &str) -> Self {
        Self(msg.to_string())
    }
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

/// Digits only; a mobile number must leave exactly ten of them
pub fn phone_digits(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

impl LeadSubmission {
    pub fn validate(self) -> Result<NewLead, ValidationError> {
        let required = [
            &self.name,
            &self.email,
            &self.instagram,
            &self.phone,
            &self.quote_price,
            &self.niche_category,
            &self.experience_level,
            &self.city,
            &self.followers,
        ];
        if required.iter().any(|v| v.trim().is_empty()) {
            return Err(ValidationError::new("Please fill in all fields."));
        }
        if !is_valid_email(self.email.trim()) {
            return Err(ValidationError::new("Please enter a valid email address."));
        }

        Ok(NewLead {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            instagram: self.instagram.trim().to_string(),
            phone: self.phone.trim().to_string(),
            niche_category: self.niche_category,
            experience_level: self.experience_level,
            city: self.city.trim().to_string(),
            followers: self.followers.trim().to_string(),
            quote_price: self.quote_price.trim().to_string(),
        })
    }
}

impl QuoteContact {
    /// Check the contact fields and attach the computed average price
    pub fn into_lead(self, quote_price: f64) -> Result<NewLead, ValidationError> {
        if [&self.name, &self.email, &self.instagram, &self.phone]
            .iter()
            .any(|v| v.trim().is_empty())
        {
            return Err(ValidationError::new("Please fill in all fields."));
        }
        if !is_valid_email(self.email.trim()) {
            return Err(ValidationError::new("Please enter a valid email address."));
        }
        if phone_digits(&self.phone).len() != 10 {
            return Err(ValidationError::new(
                "Please enter a valid 10-digit mobile number.",
            ));
        }

        Ok(NewLead {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            instagram: self.instagram.trim().to_string(),
            phone: self.phone.trim().to_string(),
            quote_price: quote_price.to_string(),
            ..NewLead::default()
        })
    }
}

impl SurveyAnswers {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.niche_category.trim().is_empty() || self.experience_level.trim().is_empty() {
            return Err(ValidationError::new(
                "Please select an option for both questions.",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> QuoteContact {
        QuoteContact {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            instagram: "asha.creates".to_string(),
            phone: "+91 98765-43210".to_string(),
        }
    }

    #[test]
    fn email_pattern_matches_loose_addresses() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.d"));
        assert!(!is_valid_email("@c.d"));
    }

    #[test]
    fn phone_with_country_code_is_rejected() {
        let err = contact().into_lead(1000.0).unwrap_err();
        assert_eq!(err.0, "Please enter a valid 10-digit mobile number.");

        let ok = QuoteContact {
            phone: "98765-43210".to_string(),
            ..contact()
        }
        .into_lead(1000.0)
        .unwrap();
        assert_eq!(ok.quote_price, "1000");
        assert_eq!(ok.instagram, "asha.creates");
    }

    #[test]
    fn missing_contact_field_is_rejected() {
        let err = QuoteContact {
            instagram: "  ".to_string(),
            ..contact()
        }
        .into_lead(1.0)
        .unwrap_err();
        assert_eq!(err.0, "Please fill in all fields.");
    }

    #[test]
    fn submission_requires_every_field() {
        let mut submission = LeadSubmission {
            name: "Ravi".to_string(),
            email: "ravi@example.com".to_string(),
            instagram: "ravi".to_string(),
            phone: "9876543210".to_string(),
            quote_price: "₹25,000".to_string(),
            niche_category: "tech".to_string(),
            experience_level: "Beginner".to_string(),
            city: "Delhi".to_string(),
            followers: "12k".to_string(),
        };
        let lead = submission.clone().validate().unwrap();
        assert_eq!(lead.quote_price, "₹25,000");

        submission.city.clear();
        assert!(submission.validate().is_err());
    }

    #[test]
    fn survey_needs_both_answers() {
        let answers = SurveyAnswers {
            email: "x@y.z".to_string(),
            niche_category: "Tech & Engineering".to_string(),
            experience_level: String::new(),
        };
        assert!(answers.validate().is_err());
    }
}
