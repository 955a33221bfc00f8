//! Process-local store used by `serve --in-memory` and the test suite.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{LeadStore, ProfileStore, StoreError, StoreResult};
use crate::models::{Lead, NewLead, Profile, ProfileDraft, SurveyAnswers};

#[derive(Default)]
pub struct MemoryStore {
    profiles: RwLock<Vec<Profile>>,
    leads: RwLock<Vec<Lead>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn profiles(&self) -> Vec<Profile> {
        self.profiles.read().await.clone()
    }

    #[cfg(test)]
    pub async fn leads(&self) -> Vec<Lead> {
        self.leads.read().await.clone()
    }
}

fn apply(profile: &mut Profile, draft: &ProfileDraft) {
    profile.username = draft.username.clone();
    profile.full_name = draft.full_name.clone();
    profile.tagline = draft.tagline.clone();
    profile.bio = draft.bio.clone();
    profile.city = draft.city.clone();
    profile.is_available = draft.is_available;
    profile.contact_email = draft.contact_email.clone();
    profile.contact_phone = draft.contact_phone.clone();
    profile.brands = draft.brands.clone();
    profile.stats = Json(draft.stats.clone());
    profile.work_links = Json(draft.work_links.clone());
    profile.updated_at = Utc::now();
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Profile>> {
        let profiles = self.profiles.read().await;
        Ok(profiles.iter().find(|p| p.username == username).cloned())
    }

    async fn find_by_owner(&self, owner: Uuid) -> StoreResult<Option<Profile>> {
        let profiles = self.profiles.read().await;
        Ok(profiles.iter().find(|p| p.user_id == owner).cloned())
    }

    async fn upsert_for_owner(&self, owner: Uuid, draft: &ProfileDraft) -> StoreResult<Profile> {
        let mut profiles = self.profiles.write().await;

        if profiles
            .iter()
            .any(|p| p.username == draft.username && p.user_id != owner)
        {
            return Err(StoreError::UsernameTaken(draft.username.clone()));
        }

        if let Some(existing) = profiles.iter_mut().find(|p| p.user_id == owner) {
            apply(existing, draft);
            return Ok(existing.clone());
        }

        let now = Utc::now();
        let mut profile = Profile {
            id: profiles.len() as i64 + 1,
            user_id: owner,
            username: String::new(),
            full_name: String::new(),
            tagline: String::new(),
            bio: String::new(),
            city: String::new(),
            is_available: true,
            contact_email: String::new(),
            contact_phone: String::new(),
            brands: Vec::new(),
            stats: Json(Default::default()),
            work_links: Json(Vec::new()),
            created_at: now,
            updated_at: now,
        };
        apply(&mut profile, draft);
        profiles.push(profile.clone());

        Ok(profile)
    }
}

#[async_trait]
impl LeadStore for MemoryStore {
    async fn insert_lead(&self, lead: &NewLead) -> StoreResult<Lead> {
        let mut leads = self.leads.write().await;

        let stored = Lead {
            id: leads.len() as i64 + 1,
            name: lead.name.clone(),
            email: lead.email.clone(),
            instagram: lead.instagram.clone(),
            phone: lead.phone.clone(),
            niche_category: lead.niche_category.clone(),
            experience_level: lead.experience_level.clone(),
            city: lead.city.clone(),
            followers: lead.followers.clone(),
            quote_price: lead.quote_price.clone(),
            created_at: Utc::now(),
        };
        leads.push(stored.clone());

        Ok(stored)
    }

    async fn merge_survey(&self, answers: &SurveyAnswers) -> StoreResult<u64> {
        let mut leads = self.leads.write().await;
        let mut matched = 0;

        for lead in leads.iter_mut().filter(|l| l.email == answers.email) {
            lead.niche_category = answers.niche_category.clone();
            lead.experience_level = answers.experience_level.clone();
            matched += 1;
        }

        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProfileForm;

    fn draft(username: &str, city: &str) -> ProfileDraft {
        ProfileForm {
            username: username.to_string(),
            city: city.to_string(),
            ..ProfileForm::default()
        }
        .into_draft()
    }

    #[tokio::test]
    async fn second_save_updates_the_same_row() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();

        let first = store.upsert_for_owner(owner, &draft("maya", "Pune")).await.unwrap();
        let second = store
            .upsert_for_owner(owner, &draft("maya.k", "Goa"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        let rows = store.profiles().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].username, "maya.k");
        assert_eq!(rows[0].city, "Goa");
        assert!(store.find_by_username("maya").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn usernames_are_unique_across_owners() {
        let store = MemoryStore::new();
        store
            .upsert_for_owner(Uuid::new_v4(), &draft("taken", ""))
            .await
            .unwrap();

        let err = store
            .upsert_for_owner(Uuid::new_v4(), &draft("taken", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UsernameTaken(name) if name == "taken"));
    }

    #[tokio::test]
    async fn survey_merges_into_every_matching_lead() {
        let store = MemoryStore::new();
        let lead = NewLead {
            name: "A".to_string(),
            email: "a@b.co".to_string(),
            ..NewLead::default()
        };
        store.insert_lead(&lead).await.unwrap();
        store.insert_lead(&lead).await.unwrap();
        store
            .insert_lead(&NewLead {
                email: "other@b.co".to_string(),
                ..lead.clone()
            })
            .await
            .unwrap();

        let matched = store
            .merge_survey(&SurveyAnswers {
                email: "a@b.co".to_string(),
                niche_category: "Gaming & Esports".to_string(),
                experience_level: "Pro".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(matched, 2);
        let leads = store.leads().await;
        assert_eq!(leads[2].experience_level, "");
        assert_eq!(leads[0].experience_level, "Pro");
    }
}
