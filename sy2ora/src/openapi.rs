//! OpenAPI document for the conversion API, served at `/api-docs/openapi.json` and rendered at
//! `/docs`.

use crate::api::models::conversions::{ConvertResponse, ConvertedFileResponse, ErrorResponse, SkippedFileResponse};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(crate::api::handlers::conversions::convert_multiple),
    components(schemas(ConvertResponse, ConvertedFileResponse, SkippedFileResponse, ErrorResponse)),
    tags(
        (name = "conversions", description = "Sybase to Oracle SQL conversion"),
    ),
    info(
        title = "sy2ora",
        description = "Batch conversion of Sybase SQL files to Oracle SQL through a code-generation model.",
    )
)]
pub struct ApiDoc;
