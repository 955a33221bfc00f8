use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use super::{ValidationError, lead::is_valid_email};

/// Most video links a profile can carry
pub const MAX_WORK_LINKS: usize = 3;

/// A creator's public portfolio, one row per owner
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Profile {
    pub id: i64,
    pub user_id: Uuid,
    pub username: String,
    pub full_name: String,
    pub tagline: String,
    pub bio: String,
    pub city: String,
    pub is_available: bool,
    pub contact_email: String,
    pub contact_phone: String,
    pub brands: Vec<String>,
    pub stats: Json<ProfileStats>,
    pub work_links: Json<Vec<WorkLink>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileStats {
    pub followers: String,
    pub reach: String,
    pub platform: String,
    pub platform_url: String,
    pub instagram: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkLink {
    pub title: String,
    pub url: String,
}

/// Normalised values written by an upsert
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileDraft {
    pub username: String,
    pub full_name: String,
    pub tagline: String,
    pub bio: String,
    pub city: String,
    pub is_available: bool,
    pub contact_email: String,
    pub contact_phone: String,
    pub brands: Vec<String>,
    pub stats: ProfileStats,
    pub work_links: Vec<WorkLink>,
}

impl ProfileDraft {
    /// Required fields, contact email and link schemes; nothing is stored when this fails
    pub fn validate(&self) -> Result<(), ValidationError> {
        if [&self.username, &self.full_name, &self.city, &self.contact_email]
            .iter()
            .any(|v| v.trim().is_empty())
        {
            return Err(ValidationError::new(
                "Please fill in your username, name, city and email.",
            ));
        }
        if !is_valid_email(&self.contact_email) {
            return Err(ValidationError::new("Please enter a valid email address."));
        }

        let links = std::iter::once(self.stats.platform_url.as_str())
            .chain(self.work_links.iter().map(|l| l.url.as_str()));
        for url in links {
            if !url.is_empty() && !is_web_url(url) {
                return Err(ValidationError::new(
                    "Links must start with http:// or https://.",
                ));
            }
        }

        Ok(())
    }
}

/// Only plain web links may end up in an `href` on a public page
pub fn is_web_url(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

/// Flat edit form exchanged with the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub username: String,
    pub full_name: String,
    pub instagram: String,
    pub platform: String,
    pub platform_url: String,
    pub city: String,
    pub tagline: String,
    pub bio: String,
    pub followers: String,
    pub reach: String,
    /// Comma separated brand names
    pub brands: String,
    pub email: String,
    pub phone: String,
    pub is_available: bool,
    pub video1_title: String,
    pub video1_url: String,
    pub video2_title: String,
    pub video2_url: String,
    pub video3_title: String,
    pub video3_url: String,
}

impl Default for ProfileForm {
    fn default() -> Self {
        Self {
            username: String::new(),
            full_name: String::new(),
            instagram: String::new(),
            platform: "instagram".to_string(),
            platform_url: String::new(),
            city: String::new(),
            tagline: String::new(),
            bio: String::new(),
            followers: String::new(),
            reach: String::new(),
            brands: String::new(),
            email: String::new(),
            phone: String::new(),
            is_available: true,
            video1_title: String::new(),
            video1_url: String::new(),
            video2_title: String::new(),
            video2_url: String::new(),
            video3_title: String::new(),
            video3_url: String::new(),
        }
    }
}

impl ProfileForm {
    /// Populate the form from a stored profile
    pub fn from_profile(profile: &Profile) -> Self {
        let link = |i: usize| profile.work_links.0.get(i).cloned();
        let (video1_title, video1_url) = split_link(link(0));
        let (video2_title, video2_url) = split_link(link(1));
        let (video3_title, video3_url) = split_link(link(2));
        let stats = &profile.stats.0;

        Self {
            username: profile.username.clone(),
            full_name: profile.full_name.clone(),
            instagram: stats.instagram.clone(),
            platform: if stats.platform.is_empty() {
                "instagram".to_string()
            } else {
                stats.platform.clone()
            },
            platform_url: stats.platform_url.clone(),
            city: profile.city.clone(),
            tagline: profile.tagline.clone(),
            bio: profile.bio.clone(),
            followers: stats.followers.clone(),
            reach: stats.reach.clone(),
            brands: profile.brands.join(", "),
            email: profile.contact_email.clone(),
            phone: profile.contact_phone.clone(),
            is_available: profile.is_available,
            video1_title,
            video1_url,
            video2_title,
            video2_url,
            video3_title,
            video3_url,
        }
    }

    /// Normalise the submitted form into the values that get stored
    pub fn into_draft(self) -> ProfileDraft {
        let videos = [
            (self.video1_title, self.video1_url),
            (self.video2_title, self.video2_url),
            (self.video3_title, self.video3_url),
        ];
        let work_links = videos
            .into_iter()
            .filter(|(_, url)| !url.is_empty())
            .map(|(title, url)| WorkLink { title, url })
            .collect();

        ProfileDraft {
            username: normalize_username(&self.username),
            full_name: self.full_name.trim().to_string(),
            tagline: self.tagline,
            bio: self.bio,
            city: self.city.trim().to_string(),
            is_available: self.is_available,
            contact_email: self.email.trim().to_string(),
            contact_phone: self.phone,
            brands: parse_brands(&self.brands),
            stats: ProfileStats {
                followers: self.followers,
                reach: self.reach,
                platform: self.platform,
                platform_url: self.platform_url,
                instagram: self.instagram,
            },
            work_links,
        }
    }
}

fn split_link(link: Option<WorkLink>) -> (String, String) {
    link.map(|l| (l.title, l.url)).unwrap_or_default()
}

/// Lower-case and drop every whitespace character
pub fn normalize_username(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Split a comma separated list, trimming entries and discarding empty ones
pub fn parse_brands(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_is_lowercased_and_stripped() {
        assert_eq!(normalize_username("  Jane Doe\t99 "), "janedoe99");
        assert_eq!(normalize_username("ALREADYfine"), "alreadyfine");
    }

    #[test]
    fn brands_drop_empty_entries() {
        assert_eq!(
            parse_brands(" Nike, ,Adidas,,  Puma "),
            vec!["Nike", "Adidas", "Puma"]
        );
        assert!(parse_brands("").is_empty());
        assert!(parse_brands(" , ,").is_empty());
    }

    #[test]
    fn draft_keeps_only_videos_with_urls_in_order() {
        let form = ProfileForm {
            username: "Creator One".to_string(),
            video1_title: "skipped".to_string(),
            video2_title: "second".to_string(),
            video2_url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
            video3_title: String::new(),
            video3_url: "https://instagram.com/p/abc".to_string(),
            ..ProfileForm::default()
        };

        let draft = form.into_draft();
        assert_eq!(draft.username, "creatorone");
        assert_eq!(
            draft.work_links,
            vec![
                WorkLink {
                    title: "second".to_string(),
                    url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
                },
                WorkLink {
                    title: String::new(),
                    url: "https://instagram.com/p/abc".to_string(),
                },
            ]
        );
        assert_eq!(draft.stats.platform, "instagram");
        assert!(draft.is_available);
    }

    fn complete_form() -> ProfileForm {
        ProfileForm {
            username: "maya".to_string(),
            full_name: "Maya Kapoor".to_string(),
            city: "Pune".to_string(),
            email: "maya@example.com".to_string(),
            ..ProfileForm::default()
        }
    }

    #[test]
    fn complete_form_passes_validation() {
        assert!(complete_form().into_draft().validate().is_ok());
    }

    #[test]
    fn required_fields_are_enforced() {
        for blank in ["username", "full_name", "city", "email"] {
            let mut form = complete_form();
            match blank {
                "username" => form.username = "  ".to_string(),
                "full_name" => form.full_name.clear(),
                "city" => form.city = " ".to_string(),
                _ => form.email.clear(),
            }
            let err = form.into_draft().validate().unwrap_err();
            assert_eq!(err.0, "Please fill in your username, name, city and email.", "{blank}");
        }

        let err = ProfileForm {
            email: "maya@example".to_string(),
            ..complete_form()
        }
        .into_draft()
        .validate()
        .unwrap_err();
        assert_eq!(err.0, "Please enter a valid email address.");
    }

    #[test]
    fn script_links_are_rejected() {
        let video = ProfileForm {
            video1_url: "javascript:alert(1)".to_string(),
            ..complete_form()
        };
        assert!(video.into_draft().validate().is_err());

        let platform = ProfileForm {
            platform_url: " JavaScript:alert(1)".to_string(),
            ..complete_form()
        };
        assert!(platform.into_draft().validate().is_err());

        let fine = ProfileForm {
            platform_url: "HTTPS://instagram.com/maya".to_string(),
            video1_url: "http://youtu.be/dQw4w9WgXcQ".to_string(),
            ..complete_form()
        };
        assert!(fine.into_draft().validate().is_ok());
    }

    #[test]
    fn form_round_trips_through_stored_profile() {
        let profile = Profile {
            id: 1,
            user_id: Uuid::nil(),
            username: "maya".to_string(),
            full_name: "Maya".to_string(),
            tagline: String::new(),
            bio: String::new(),
            city: "Pune".to_string(),
            is_available: false,
            contact_email: "maya@example.com".to_string(),
            contact_phone: String::new(),
            brands: vec!["Boat".to_string(), "Mamaearth".to_string()],
            stats: Json(ProfileStats {
                platform: "youtube".to_string(),
                ..ProfileStats::default()
            }),
            work_links: Json(vec![WorkLink {
                title: "Launch".to_string(),
                url: "https://youtu.be/abc".to_string(),
            }]),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let form = ProfileForm::from_profile(&profile);
        assert_eq!(form.brands, "Boat, Mamaearth");
        assert_eq!(form.platform, "youtube");
        assert_eq!(form.video1_url, "https://youtu.be/abc");
        assert!(form.video2_url.is_empty());
        assert!(!form.is_available);

        let draft = form.into_draft();
        assert_eq!(draft.brands, profile.brands);
        assert_eq!(draft.work_links, profile.work_links.0);
    }
}
