use modula_core::{Inject, Registry};

use super::MODULE;
use super::configuration::ProjectConfiguration;
use super::types::{SaveLocation, SaveLocationType, SaveMode, SaveToCloudResponse};
use crate::cloud::{AudioCloudService, CloudService};
use crate::framework::Interactive;
use crate::{Error, Result};

/// Decides where a project is opened from and saved to.
pub trait OpenSaveProjectScenario: Send + Sync {
    /// Work out where to save.
    ///
    /// With `preselected` left `Undefined`, the remembered location is used
    /// or the user is asked. A cloud location the user cannot reach may
    /// fall back to a local one.
    fn ask_save_location(&self, mode: SaveMode, preselected: SaveLocationType)
    -> Result<SaveLocation>;

    /// Check that the project can be published to the cloud.
    fn ask_publish_location(&self) -> Result<()>;

    /// Check that audio can be shared to the audio cloud.
    fn ask_share_audio_location(&self) -> Result<()>;

    /// Tell the user the cloud is unreachable and ask what to do.
    fn warn_cloud_not_available(&self, is_publish: bool) -> Result<SaveToCloudResponse>;
}

/// [`OpenSaveProjectScenario`] driven by the project configuration and
/// the [`Interactive`] capability.
pub struct OpenSaveScenario {
    configuration: Inject<dyn ProjectConfiguration>,
    interactive: Inject<dyn Interactive>,
    cloud: Inject<dyn CloudService>,
    audio_cloud: Inject<dyn AudioCloudService>,
}

impl OpenSaveScenario {
    pub fn new(registry: &Registry) -> Self {
        Self {
            configuration: Inject::with_registry(registry, MODULE),
            interactive: Inject::with_registry(registry, MODULE),
            cloud: Inject::with_registry(registry, MODULE),
            audio_cloud: Inject::with_registry(registry, MODULE),
        }
    }

    /// The location type to save to, asking the user unless a remembered
    /// choice exists.
    pub fn save_location_type(&self) -> Result<SaveLocationType> {
        let configuration = self.configuration.required()?;
        let last_used = configuration.last_used_save_location_type();
        if !configuration.should_ask_save_location_type() && last_used != SaveLocationType::Undefined
        {
            return Ok(last_used);
        }

        let choice = self
            .interactive
            .required()?
            .choose_save_location(last_used == SaveLocationType::Cloud)
            .ok_or(Error::Cancelled)?;
        let chosen = if choice.cloud {
            SaveLocationType::Cloud
        } else {
            SaveLocationType::Local
        };

        configuration.set_last_used_save_location_type(chosen);
        configuration.set_should_ask_save_location_type(!choice.remember);
        Ok(chosen)
    }

    fn ask_cloud_location(&self, is_publish: bool) -> Result<SaveToCloudResponse> {
        if self.cloud.required()?.is_authorized() {
            return Ok(SaveToCloudResponse::Ok);
        }
        self.warn_cloud_not_available(is_publish)
    }
}

impl OpenSaveProjectScenario for OpenSaveScenario {
    fn ask_save_location(
        &self,
        mode: SaveMode,
        preselected: SaveLocationType,
    ) -> Result<SaveLocation> {
        let location_type = match preselected {
            SaveLocationType::Undefined => self.save_location_type()?,
            other => other,
        };

        match location_type {
            SaveLocationType::Undefined => Err(Error::UndefinedLocation),
            SaveLocationType::Local => Ok(SaveLocation {
                location_type,
                mode,
            }),
            SaveLocationType::Cloud => match self.ask_cloud_location(false)? {
                SaveToCloudResponse::Ok => Ok(SaveLocation {
                    location_type,
                    mode,
                }),
                SaveToCloudResponse::SaveLocallyInstead => {
                    log::debug!("cloud unavailable, saving locally");
                    self.ask_save_location(mode, SaveLocationType::Local)
                }
                SaveToCloudResponse::Cancel => Err(Error::Cancelled),
            },
        }
    }

    fn ask_publish_location(&self) -> Result<()> {
        match self.ask_cloud_location(true)? {
            SaveToCloudResponse::Ok => Ok(()),
            _ => Err(Error::Cancelled),
        }
    }

    fn ask_share_audio_location(&self) -> Result<()> {
        if self.audio_cloud.required()?.is_authorized() {
            return Ok(());
        }
        self.interactive.required()?.question(
            "Unable to share audio",
            "The audio sharing service cannot be reached. Check your connection and try again.",
            &["Ok"],
        );
        Err(Error::Cancelled)
    }

    fn warn_cloud_not_available(&self, is_publish: bool) -> Result<SaveToCloudResponse> {
        let interactive = self.interactive.required()?;
        let text = "The cloud cannot be reached. Check your connection and try again.";

        if is_publish {
            interactive.question("Unable to publish", text, &["Cancel"]);
            return Ok(SaveToCloudResponse::Cancel);
        }

        let response = match interactive.question(
            "Unable to save to the cloud",
            text,
            &["Cancel", "Save locally instead"],
        ) {
            Some(1) => SaveToCloudResponse::SaveLocallyInstead,
            _ => SaveToCloudResponse::Cancel,
        };
        Ok(response)
    }
}
