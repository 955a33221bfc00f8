//! Rate card for branded content.
//!
//! A quote is a pure function of three inputs: expected views, the creator's niche and
//! the usage rights the brand wants. Nothing here touches the store; only the average of
//! a computed [`Quote`] ends up on a lead.

use serde::Serialize;
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::models::ValidationError;

pub const MIN_VIEWS: f64 = 1000.0;

const DEFAULT_CPM: f64 = 250.0;
const DEFAULT_PRODUCTION_FEE: f64 = 700.0;
const DEFAULT_MULTIPLIER: f64 = 1.0;

const LOW_BAND: f64 = 0.80;
const HIGH_BAND: f64 = 1.50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Niche {
    Tech,
    Finance,
    Beauty,
    Health,
    Travel,
    Food,
    Lifestyle,
    Gaming,
}

impl Niche {
    /// Lower-case key used in forms and requests
    pub fn key(self) -> &'static str {
        self.into()
    }

    pub fn cpm(self) -> f64 {
        match self {
            Niche::Tech => 500.0,
            Niche::Finance => 800.0,
            Niche::Beauty => 450.0,
            Niche::Health => 400.0,
            Niche::Travel => 400.0,
            Niche::Food => 350.0,
            Niche::Lifestyle => 250.0,
            Niche::Gaming => 150.0,
        }
    }

    pub fn production_fee(self) -> f64 {
        match self {
            Niche::Tech => 950.0,
            Niche::Finance => 800.0,
            Niche::Beauty => 700.0,
            Niche::Health => 700.0,
            Niche::Travel => 700.0,
            Niche::Food => 650.0,
            Niche::Lifestyle => 700.0,
            Niche::Gaming => 600.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Niche::Tech => "Tech & Engineering",
            Niche::Finance => "Finance & SaaS",
            Niche::Beauty => "Beauty & Makeup",
            Niche::Health => "Health & Fitness",
            Niche::Travel => "Travel & Vlog",
            Niche::Food => "Food & Drinks",
            Niche::Lifestyle => "Lifestyle & Fashion",
            Niche::Gaming => "Gaming & Esports",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum RightsTier {
    Social,
    Full,
    Perpetual,
}

impl RightsTier {
    pub fn key(self) -> &'static str {
        self.into()
    }

    pub fn multiplier(self) -> f64 {
        match self {
            RightsTier::Social => 1.0,
            RightsTier::Full => 1.5,
            RightsTier::Perpetual => 2.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RightsTier::Social => "Social Only",
            RightsTier::Full => "Full Usage",
            RightsTier::Perpetual => "Perpetual",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RightsTier::Social => "Standard organic usage on social media.",
            RightsTier::Full => "Includes Paid Ads and Digital Rights.",
            RightsTier::Perpetual => "Lifetime buyout. Brand owns the video.",
        }
    }
}

/// CPM for a niche key; unknown keys use the lifestyle-level default
pub fn cpm_for(niche: &str) -> f64 {
    niche.parse::<Niche>().map(Niche::cpm).unwrap_or(DEFAULT_CPM)
}

/// Flat production fee for a niche key, defaulted independently of the CPM
pub fn production_fee_for(niche: &str) -> f64 {
    niche
        .parse::<Niche>()
        .map(Niche::production_fee)
        .unwrap_or(DEFAULT_PRODUCTION_FEE)
}

pub fn multiplier_for(rights: &str) -> f64 {
    rights
        .parse::<RightsTier>()
        .map(RightsTier::multiplier)
        .unwrap_or(DEFAULT_MULTIPLIER)
}

/// Parse the views field the way it is typed into the calculator ("50,000" is fine)
pub fn parse_views(raw: &str) -> Result<f64, ValidationError> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let views = cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ValidationError::new("Please enter a valid number for views."))?;

    if views < MIN_VIEWS {
        return Err(ValidationError::new("Please enter a minimum of 1,000 views."));
    }

    Ok(views)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quote {
    pub views: f64,
    pub base_rate: f64,
    pub production_fee: f64,
    pub multiplier: f64,
    pub average: f64,
    pub minimum: f64,
    pub maximum: f64,
}

impl Quote {
    /// Price band for already validated views
    pub fn compute(views: f64, niche: &str, rights: &str) -> Self {
        let base_rate = (views / 1000.0) * cpm_for(niche);
        let production_fee = production_fee_for(niche);
        let multiplier = multiplier_for(rights);

        let average = (base_rate + production_fee) * multiplier;

        Self {
            views,
            base_rate,
            production_fee,
            multiplier,
            average,
            minimum: average * LOW_BAND,
            maximum: average * HIGH_BAND,
        }
    }

    /// Validate the raw views field, then compute
    pub fn from_input(views: &str, niche: &str, rights: &str) -> Result<Self, ValidationError> {
        let views = parse_views(views)?;
        Ok(Self::compute(views, niche, rights))
    }
}

/// Format an amount as whole rupees with Indian digit grouping, e.g. `₹12,34,567`
pub fn format_inr(amount: f64) -> String {
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());

    format!("{sign}₹{}", group_indian(&digits))
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{tail}", groups.join(","))
}

/// Niche options in display order, for forms
pub fn niche_options() -> Vec<(&'static str, &'static str)> {
    Niche::iter().map(|n| (n.key(), n.label())).collect()
}

/// Rights options in display order, for forms
pub fn rights_options() -> Vec<(&'static str, &'static str, &'static str)> {
    RightsTier::iter()
        .map(|r| (r.key(), r.label(), r.description()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worked_example_matches_rate_card() {
        let quote = Quote::from_input("50000", "tech", "full").unwrap();
        assert_eq!(quote.base_rate, 25000.0);
        assert_eq!(quote.production_fee, 950.0);
        assert_eq!(quote.multiplier, 1.5);
        assert_eq!(quote.average, 38925.0);
        assert_eq!(quote.minimum, 31140.0);
        assert_eq!(quote.maximum, 58387.5);
    }

    #[test]
    fn formula_holds_for_every_niche_and_tier() {
        for niche in Niche::iter() {
            for tier in RightsTier::iter() {
                for views in [1000.0, 2500.0, 123_456.0] {
                    let quote = Quote::compute(views, niche.key(), tier.key());
                    let expected =
                        ((views / 1000.0) * niche.cpm() + niche.production_fee()) * tier.multiplier();
                    assert_eq!(quote.average, expected);
                    assert_eq!(quote.minimum, 0.8 * expected);
                    assert_eq!(quote.maximum, 1.5 * expected);
                }
            }
        }
    }

    #[test]
    fn unknown_keys_fall_back_independently() {
        assert_eq!(cpm_for("pets"), 250.0);
        assert_eq!(production_fee_for("pets"), 700.0);
        assert_eq!(multiplier_for("forever"), 1.0);

        let quote = Quote::compute(10_000.0, "pets", "forever");
        assert_eq!(quote.average, 10.0 * 250.0 + 700.0);
    }

    #[test]
    fn keys_are_case_sensitive_lowercase() {
        assert_eq!("gaming".parse::<Niche>(), Ok(Niche::Gaming));
        assert!("Gaming".parse::<Niche>().is_err());
        assert_eq!(cpm_for("Gaming"), 250.0);
    }

    #[test]
    fn views_validation() {
        assert_eq!(parse_views("1,000").unwrap(), 1000.0);
        assert_eq!(parse_views(" 75000 ").unwrap(), 75000.0);
        assert_eq!(
            parse_views("999").unwrap_err().0,
            "Please enter a minimum of 1,000 views."
        );
        assert_eq!(
            parse_views("lots").unwrap_err().0,
            "Please enter a valid number for views."
        );
        assert!(parse_views("").is_err());
        assert!(parse_views("inf").is_err());
        assert!(parse_views("NaN").is_err());
    }

    #[test]
    fn rupees_use_indian_grouping() {
        assert_eq!(format_inr(0.0), "₹0");
        assert_eq!(format_inr(950.0), "₹950");
        assert_eq!(format_inr(38925.0), "₹38,925");
        assert_eq!(format_inr(58387.5), "₹58,388");
        assert_eq!(format_inr(1_234_567.0), "₹12,34,567");
        assert_eq!(format_inr(123_456_789.0), "₹12,34,56,789");
    }

    #[test]
    fn options_cover_all_categories() {
        assert_eq!(niche_options().len(), 8);
        assert_eq!(niche_options()[0], ("tech", "Tech & Engineering"));
        let rights: Vec<_> = rights_options().into_iter().map(|r| r.0).collect();
        assert_eq!(rights, vec!["social", "full", "perpetual"]);
    }

    #[test]
    fn option_keys_parse_back_to_their_variant() {
        for (key, _) in niche_options() {
            assert_eq!(key.parse::<Niche>().map(Niche::key), Ok(key));
        }
        for (key, _, _) in rights_options() {
            assert_eq!(key.parse::<RightsTier>().map(RightsTier::key), Ok(key));
        }
        assert_eq!(Niche::Gaming.key(), "gaming");
    }
}
