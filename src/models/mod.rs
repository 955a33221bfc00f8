mod lead;
mod profile;

pub use lead::{Lead, LeadSubmission, NewLead, QuoteContact, SurveyAnswers, ValidationError};
pub use profile::{MAX_WORK_LINKS, Profile, ProfileDraft, ProfileForm, is_web_url};
