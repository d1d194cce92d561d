use serde::{Deserialize, Serialize};

use crate::{companies::repo::Company, uploads::UploadItem};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCompanyRequest {
    #[serde(default)]
    pub company_name: Option<String>,
}

/// Multipart update. Absent fields keep their stored value.
#[derive(Debug, Default)]
pub struct CompanyChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub logo: Option<UploadItem>,
}

#[derive(Debug, Serialize)]
pub struct CompanyResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub company: Company,
}

#[derive(Debug, Serialize)]
pub struct CompanyListResponse {
    pub success: bool,
    pub companies: Vec<Company>,
}
