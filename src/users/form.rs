use time::{macros::format_description, Date};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    repo_types::{ProfileChanges, User},
    services,
};
use crate::{
    images::{
        services::{discard_image, upload_image, ImageFolder},
        ImageError, ImageFile, ImageUpload, PreviewRegistry, PreviewToken,
    },
    state::AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    #[error("Birthday must be a valid date (YYYY-MM-DD)")]
    InvalidBirthday,
    #[error("Could not load user profile.")]
    NotFound,
    #[error("Profile picture upload failed. Please try again.")]
    UploadFailed,
    #[error("Failed to update profile. Please try again.")]
    UpdateFailed,
}

impl ProfileError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ProfileError::InvalidBirthday)
    }
}

/// The edit-profile form, seeded from the stored record.
pub struct ProfileForm {
    user_id: Uuid,
    current_pic: Option<String>,
    name: String,
    city: String,
    birthday: String,
    networks: Vec<String>,
    picture: Option<ImageFile>,
    upload: ImageUpload,
    submitting: bool,
    error: Option<String>,
}

impl ProfileForm {
    pub fn from_user(user: &User, previews: PreviewRegistry) -> Self {
        Self {
            user_id: user.id,
            current_pic: user.profile_pic.clone(),
            name: user.name.clone().unwrap_or_default(),
            city: user.city.clone().unwrap_or_default(),
            birthday: user.birthday.map(format_iso_date).unwrap_or_default(),
            networks: user.networks.clone().unwrap_or_default(),
            picture: None,
            upload: ImageUpload::new(previews),
            submitting: false,
            error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn birthday(&self) -> &str {
        &self.birthday
    }

    pub fn networks(&self) -> &[String] {
        &self.networks
    }

    pub fn current_pic(&self) -> Option<&str> {
        self.current_pic.as_deref()
    }

    pub fn picture(&self) -> Option<&ImageFile> {
        self.picture.as_ref()
    }

    pub fn upload(&self) -> &ImageUpload {
        &self.upload
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_city(&mut self, city: impl Into<String>) {
        self.city = city.into();
    }

    pub fn set_birthday(&mut self, birthday: impl Into<String>) {
        self.birthday = birthday.into();
    }

    pub fn set_networks(&mut self, networks: Vec<String>) {
        self.networks = networks;
    }

    pub fn add_network(&mut self) {
        self.networks.push(String::new());
    }

    pub fn set_network(&mut self, index: usize, value: impl Into<String>) -> bool {
        match self.networks.get_mut(index) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    pub fn remove_network(&mut self, index: usize) -> bool {
        if index < self.networks.len() {
            self.networks.remove(index);
            true
        } else {
            false
        }
    }

    pub fn select_picture(&mut self, file: ImageFile) -> Result<(), ImageError> {
        let picture = &mut self.picture;
        self.upload.select(file, |f| *picture = f)
    }

    pub fn restore_picture(&mut self, token: PreviewToken) {
        let picture = &mut self.picture;
        self.upload.restore(token, |f| *picture = f);
    }

    pub fn remove_picture(&mut self) {
        let picture = &mut self.picture;
        self.upload.remove(|f| *picture = f);
    }

    pub fn replace_picture(&mut self) {
        self.remove_picture();
        self.upload.open_file_picker();
    }

    /// Uploads the new picture if one was chosen, then updates the user row
    /// and returns the stored record.
    pub async fn submit(&mut self, st: &AppState) -> Result<User, ProfileError> {
        self.error = None;
        self.submitting = true;
        let result = self.save(st).await;
        self.submitting = false;

        match result {
            Ok(user) => {
                self.current_pic = user.profile_pic.clone();
                let picture = &mut self.picture;
                self.upload.reset(|f| *picture = f);
                Ok(user)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn save(&self, st: &AppState) -> Result<User, ProfileError> {
        let mut changes = self.changes()?;

        let stored = match &self.picture {
            Some(file) => Some(
                upload_image(st.storage.as_ref(), ImageFolder::Profiles, file)
                    .await
                    .map_err(|e| {
                        error!(error = ?e, "profile picture upload failed");
                        ProfileError::UploadFailed
                    })?,
            ),
            None => None,
        };
        if let Some(stored) = &stored {
            changes.profile_pic = Some(stored.public_url.clone());
        }

        let err = match services::update_profile(st, self.user_id, &changes).await {
            Ok(Some(user)) => {
                info!(user_id = %user.id, "profile updated");
                return Ok(user);
            }
            Ok(None) => {
                warn!(user_id = %self.user_id, "profile row vanished before update");
                ProfileError::NotFound
            }
            Err(e) => {
                error!(error = ?e, user_id = %self.user_id, "profile update failed");
                ProfileError::UpdateFailed
            }
        };
        if let Some(stored) = &stored {
            discard_image(st.storage.as_ref(), stored).await;
        }
        Err(err)
    }

    /// Blank fields become NULL and blank network entries are dropped.
    fn changes(&self) -> Result<ProfileChanges, ProfileError> {
        let birthday = match self.birthday.trim() {
            "" => None,
            raw => Some(parse_iso_date(raw).ok_or(ProfileError::InvalidBirthday)?),
        };
        Ok(ProfileChanges {
            name: non_blank(&self.name),
            birthday,
            city: non_blank(&self.city),
            networks: self
                .networks
                .iter()
                .filter_map(|n| non_blank(n))
                .collect(),
            profile_pic: self.current_pic.clone(),
        })
    }
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn parse_iso_date(raw: &str) -> Option<Date> {
    Date::parse(raw, format_description!("[year]-[month]-[day]")).ok()
}

fn format_iso_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}
