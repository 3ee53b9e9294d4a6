#![allow(clippy::needless_for_each)]

use snote_core::FieldError;

use super::schemas::{
    CreateNoteRequest, CreatedNoteResponse, ErrorResponse, HealthResponse, NoteResponse,
};

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "snote API",
        version = "0.1.0",
        description = "HTTP API for self-destructing, client-encrypted notes. Each note can be read exactly once.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Notes", description = "Create and read-once note lifecycle"),
    ),
    paths(
        super::health::health,
        super::notes::create_note,
        super::notes::get_note,
    ),
    components(schemas(
        HealthResponse,
        ErrorResponse,
        FieldError,
        CreateNoteRequest,
        CreatedNoteResponse,
        NoteResponse,
    ))
)]
pub struct ApiDoc;
