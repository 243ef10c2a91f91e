use serde::Deserialize;
use sqlx::FromRow;
use utoipa::IntoParams;

use crate::utils::version;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Maps,
    Techs,
    Tilesets,
    Scenarios,
}

impl CatalogKind {
    pub fn table(self) -> &'static str {
        match self {
            Self::Maps => "glestmaps",
            Self::Techs => "glesttechs",
            Self::Tilesets => "glesttilesets",
            Self::Scenarios => "glestscenarios",
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CatalogEntry {
    pub name: String,
    pub min_glest_version: String,
    pub crc: String,
    pub description: String,
    pub url: String,
    pub image_url: String,
    pub disabled: bool,
}

impl CatalogEntry {
    /// Whether a client running `client_version` can use this entry.
    pub fn available_to(&self, client_version: Option<&str>) -> bool {
        if self.disabled {
            return false;
        }
        match client_version {
            Some(v) if !v.is_empty() && !self.min_glest_version.is_empty() => {
                !version::is_older(v, &self.min_glest_version)
            }
            _ => true,
        }
    }

    pub fn legacy_line(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|\n",
            self.name, self.crc, self.description, self.url, self.image_url
        )
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CatalogQuery {
    /// Version of the requesting client; newer-only entries are left out.
    pub glest_version: Option<String>,
}
