use sqlx::PgPool;
use std::sync::Arc;

use crate::services::{
    archive::ArchiveTracker,
    challenge::ChallengeStore,
    mailer::CodeMailer,
    pacs::PacsClient,
    token::TokenService,
};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub pacs: Arc<PacsClient>,
    pub challenges: Arc<ChallengeStore>,
    pub tokens: Arc<TokenService>,
    pub mailer: Arc<CodeMailer>,
    pub archive_tracker: ArchiveTracker,
}

impl AppState {
    pub fn new(
        db: PgPool,
        pacs: PacsClient,
        challenges: ChallengeStore,
        tokens: TokenService,
        mailer: CodeMailer,
        archive_tracker: ArchiveTracker,
    ) -> Self {
        Self {
            db,
            pacs: Arc::new(pacs),
            challenges: Arc::new(challenges),
            tokens: Arc::new(tokens),
            mailer: Arc::new(mailer),
            archive_tracker,
        }
    }
}
