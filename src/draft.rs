//! The report draft: everything entered for one grooming session.

use std::collections::BTreeSet;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::photo::Photo;
use crate::template::{self, Template};

/// Name shown on the card when the pet name is empty
pub const FALLBACK_PET_NAME: &str = "Sweetie";

/// Feedback shown when neither notes nor rewritten notes exist
pub const FALLBACK_NOTES: &str = "Your pet did wonderfully today. See you next time!";

/// Services offered in the picker, in display order
pub const DEFAULT_SERVICES: &[&str] = &[
    "Bath",
    "Haircut & Styling",
    "Nail Trim",
    "Ear Cleaning",
    "Anal Gland Expression",
    "Teeth Brushing",
    "Deshedding",
    "SPA Massage",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(format!("unknown gender '{}'", other)),
        }
    }
}

/// Pet identity fields. All free text; empty means "not entered".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PetInfo {
    pub name: String,
    pub breed: String,
    pub age: String,
    /// Weight in kilograms, as typed
    pub weight: String,
    pub gender: Gender,
}

/// Which side of the before/after comparison a photo belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhotoRole {
    Before,
    After,
}

impl PhotoRole {
    pub const ALL: [PhotoRole; 2] = [PhotoRole::Before, PhotoRole::After];

    pub fn label(self) -> &'static str {
        match self {
            PhotoRole::Before => "BEFORE",
            PhotoRole::After => "AFTER",
        }
    }
}

/// Selected services. Membership only: no duplicates, no meaningful order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ServiceSet(BTreeSet<String>);

impl ServiceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a service; returns false if it was already selected
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.0.insert(name.to_string())
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.0.remove(name.trim())
    }

    /// Flip membership; returns whether the service is now selected
    pub fn toggle(&mut self, name: &str) -> bool {
        if self.remove(name) {
            false
        } else {
            self.insert(name)
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name.trim())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Services in display order: catalog entries first, then custom ones
    /// alphabetically.
    pub fn ordered(&self) -> Vec<&str> {
        let mut out: Vec<&str> = DEFAULT_SERVICES
            .iter()
            .copied()
            .filter(|s| self.0.contains(*s))
            .collect();
        out.extend(
            self.0
                .iter()
                .map(String::as_str)
                .filter(|s| !DEFAULT_SERVICES.contains(s)),
        );
        out
    }
}

impl From<Vec<String>> for ServiceSet {
    fn from(names: Vec<String>) -> Self {
        names.into_iter().collect()
    }
}

impl From<ServiceSet> for Vec<String> {
    fn from(set: ServiceSet) -> Self {
        set.ordered().into_iter().map(str::to_string).collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ServiceSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = ServiceSet::new();
        for s in iter {
            set.insert(s);
        }
        set
    }
}

/// All user-entered data for one grooming session.
///
/// Photos are not serialized; they are attached after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportDraft {
    pub pet: PetInfo,
    pub services: ServiceSet,
    notes: String,
    enhanced_notes: Option<String>,
    pub date: NaiveDate,
    pub groomer_name: String,
    #[serde(skip)]
    before: Option<Photo>,
    #[serde(skip)]
    after: Option<Photo>,
    pub template_id: String,
}

impl Default for ReportDraft {
    fn default() -> Self {
        Self {
            pet: PetInfo::default(),
            services: ServiceSet::new(),
            notes: String::new(),
            enhanced_notes: None,
            date: Local::now().date_naive(),
            groomer_name: String::new(),
            before: None,
            after: None,
            template_id: template::DEFAULT_TEMPLATE_ID.to_string(),
        }
    }
}

impl ReportDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Replace the raw notes. Any rewrite of the previous notes is stale
    /// and gets dropped.
    pub fn set_notes(&mut self, notes: impl Into<String>) {
        let notes = notes.into();
        if notes != self.notes {
            self.enhanced_notes = None;
        }
        self.notes = notes;
    }

    pub fn enhanced_notes(&self) -> Option<&str> {
        self.enhanced_notes.as_deref()
    }

    pub fn set_enhanced_notes(&mut self, text: impl Into<String>) {
        self.enhanced_notes = Some(text.into());
    }

    pub fn clear_enhanced_notes(&mut self) {
        self.enhanced_notes = None;
    }

    /// The feedback text the card shows
    pub fn display_notes(&self) -> &str {
        match self.enhanced_notes.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ if !self.notes.trim().is_empty() => &self.notes,
            _ => FALLBACK_NOTES,
        }
    }

    /// The pet name the card shows
    pub fn display_name(&self) -> &str {
        let name = self.pet.name.trim();
        if name.is_empty() {
            FALLBACK_PET_NAME
        } else {
            name
        }
    }

    pub fn photo(&self, role: PhotoRole) -> Option<&Photo> {
        match role {
            PhotoRole::Before => self.before.as_ref(),
            PhotoRole::After => self.after.as_ref(),
        }
    }

    /// Attach a photo to a role, returning the one it replaces
    pub fn set_photo(&mut self, role: PhotoRole, photo: Photo) -> Option<Photo> {
        self.slot(role).replace(photo)
    }

    pub fn clear_photo(&mut self, role: PhotoRole) -> Option<Photo> {
        self.slot(role).take()
    }

    /// Photos present on the draft, in before/after order
    pub fn photos(&self) -> impl Iterator<Item = (PhotoRole, &Photo)> {
        PhotoRole::ALL
            .into_iter()
            .filter_map(move |role| self.photo(role).map(|p| (role, p)))
    }

    /// The template this draft references; unknown ids resolve to the default
    pub fn template(&self) -> &'static Template {
        template::resolve(&self.template_id)
    }

    fn slot(&mut self, role: PhotoRole) -> &mut Option<Photo> {
        match role {
            PhotoRole::Before => &mut self.before,
            PhotoRole::After => &mut self.after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(width: u32) -> Photo {
        Photo {
            data: vec![0xFF, 0xD8, 0xFF, 0xD9],
            mime: crate::photo::PHOTO_MIME,
            width,
            height: 10,
            quality: 80,
        }
    }

    #[test]
    fn new_draft_has_defaults() {
        let d = ReportDraft::new();
        assert!(d.services.is_empty());
        assert_eq!(d.template().id, "modern-blue");
        assert_eq!(d.display_name(), FALLBACK_PET_NAME);
        assert_eq!(d.display_notes(), FALLBACK_NOTES);
        assert_eq!(d.photos().count(), 0);
    }

    #[test]
    fn services_have_no_duplicates() {
        let mut s = ServiceSet::new();
        assert!(s.insert("Bath"));
        assert!(!s.insert("Bath"));
        assert!(!s.insert("  Bath "));
        assert_eq!(s.len(), 1);
        assert!(!s.toggle("Bath"));
        assert!(s.is_empty());
        assert!(s.toggle("Nail Trim"));
    }

    #[test]
    fn services_render_in_catalog_order_then_custom() {
        let s: ServiceSet = ["Zoomies Walk", "Nail Trim", "Bath", "Aroma Rinse"]
            .into_iter()
            .collect();
        assert_eq!(
            s.ordered(),
            vec!["Bath", "Nail Trim", "Aroma Rinse", "Zoomies Walk"]
        );
    }

    #[test]
    fn setting_a_photo_replaces_the_previous_one() {
        let mut d = ReportDraft::new();
        assert!(d.set_photo(PhotoRole::Before, photo(1)).is_none());
        let old = d.set_photo(PhotoRole::Before, photo(2)).unwrap();
        assert_eq!(old.width, 1);
        assert_eq!(d.photo(PhotoRole::Before).unwrap().width, 2);
        assert!(d.photo(PhotoRole::After).is_none());
        assert_eq!(d.photos().count(), 1);
    }

    #[test]
    fn editing_notes_drops_stale_rewrite() {
        let mut d = ReportDraft::new();
        d.set_notes("calm");
        d.set_enhanced_notes("Very calm and sweet.");
        assert_eq!(d.display_notes(), "Very calm and sweet.");
        d.set_notes("calm");
        assert!(d.enhanced_notes().is_some());
        d.set_notes("a bit nervous");
        assert!(d.enhanced_notes().is_none());
        assert_eq!(d.display_notes(), "a bit nervous");
    }

    #[test]
    fn draft_json_round_trip_skips_photos() {
        let mut d = ReportDraft::new();
        d.pet.name = "Mochi".into();
        d.pet.gender = Gender::Female;
        d.services.insert("Bath");
        d.set_photo(PhotoRole::After, photo(3));
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("\"female\""));
        let back: ReportDraft = serde_json::from_str(&json).unwrap();
        assert_eq!(back.pet.name, "Mochi");
        assert!(back.services.contains("Bath"));
        assert!(back.photo(PhotoRole::After).is_none());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let d: ReportDraft =
            serde_json::from_str(r#"{"pet":{"name":"Mochi"},"notes":"did great"}"#).unwrap();
        assert_eq!(d.pet.name, "Mochi");
        assert_eq!(d.notes(), "did great");
        assert_eq!(d.template_id, "modern-blue");
    }

    #[test]
    fn services_from_json_are_cleaned_like_inserts() {
        let d: ReportDraft =
            serde_json::from_str(r#"{"services":[" Bath", "Bath", "", "  ", "Nail Trim "]}"#)
                .unwrap();
        assert_eq!(d.services.ordered(), vec!["Bath", "Nail Trim"]);
        assert!(d.services.contains("Bath"));

        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["services"], serde_json::json!(["Bath", "Nail Trim"]));
    }

    #[test]
    fn gender_parses_loosely() {
        assert_eq!("F".parse::<Gender>().unwrap(), Gender::Female);
        assert!("cat".parse::<Gender>().is_err());
    }
}
