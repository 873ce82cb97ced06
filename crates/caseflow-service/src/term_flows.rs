//! Term and definition upsert flows.
//!
//! Find-by-unique-key then update-in-place or create. A term update
//! replaces the full set of associated definitions (each itself upserted by
//! its own unique key) rather than merging.

use std::sync::Arc;

use caseflow_core::{
    Definition, DefinitionCreate, DefinitionRepository, Error, Result, Term, TermCreate,
    TermRead, TermRepository, TermUpdate,
};
use tracing::info;
use uuid::Uuid;

pub struct TermFlows {
    terms: Arc<dyn TermRepository>,
    definitions: Arc<dyn DefinitionRepository>,
}

impl TermFlows {
    pub fn new(terms: Arc<dyn TermRepository>, definitions: Arc<dyn DefinitionRepository>) -> Self {
        Self { terms, definitions }
    }

    /// Upsert a definition by its (project, text) unique key.
    ///
    /// An existing definition gets its source and team set updated in
    /// place; otherwise a new one is created.
    pub async fn upsert_definition(&self, definition_in: &DefinitionCreate) -> Result<Definition> {
        let definition = match self
            .definitions
            .get_by_text(definition_in.project_id, &definition_in.text)
            .await?
        {
            Some(existing) => match &definition_in.source {
                Some(source) => self.definitions.update_source(existing.id, source).await?,
                None => existing,
            },
            None => {
                self.definitions
                    .create(
                        definition_in.project_id,
                        &definition_in.text,
                        definition_in.source.as_deref(),
                    )
                    .await?
            }
        };

        self.definitions
            .set_teams(definition.id, &definition_in.team_ids)
            .await?;

        Ok(definition)
    }

    /// Create a term with its definitions, each upserted by unique key.
    pub async fn create_term(&self, term_in: &TermCreate) -> Result<Term> {
        let definition_ids = self.upsert_definitions(&term_in.definitions).await?;

        let term = self
            .terms
            .create(term_in.project_id, &term_in.text, term_in.discoverable)
            .await?;
        self.terms.set_definitions(term.id, &definition_ids).await?;

        info!(
            subsystem = "service",
            component = "term_flows",
            op = "create",
            term_id = %term.id,
            "Created term"
        );
        Ok(term)
    }

    /// Update an existing term. The definition list is a full replacement
    /// of the association set, not a merge.
    pub async fn update_term(&self, term_id: Uuid, term_in: &TermUpdate) -> Result<Term> {
        let definition_ids = self.upsert_definitions(&term_in.definitions).await?;

        let term = self.terms.update_base(term_id, term_in.discoverable).await?;
        self.terms.set_definitions(term.id, &definition_ids).await?;
        Ok(term)
    }

    /// Find by (project, text), then update in place or create.
    pub async fn update_or_create_term(&self, term_in: &TermCreate) -> Result<Term> {
        match self
            .terms
            .get_by_text(term_in.project_id, &term_in.text)
            .await?
        {
            Some(existing) => {
                self.update_term(
                    existing.id,
                    &TermUpdate {
                        discoverable: Some(term_in.discoverable),
                        definitions: term_in.definitions.clone(),
                    },
                )
                .await
            }
            None => self.create_term(term_in).await,
        }
    }

    /// Find by explicit id when given, else by full attribute match
    /// (project, text); create on miss. Never updates an existing term.
    pub async fn get_or_create_term(&self, term_in: &TermCreate) -> Result<Term> {
        let existing = match term_in.id {
            Some(id) => self.terms.get(id).await?,
            None => {
                self.terms
                    .get_by_text(term_in.project_id, &term_in.text)
                    .await?
            }
        };

        match existing {
            Some(term) => Ok(term),
            None => self.create_term(term_in).await,
        }
    }

    /// Assemble the read representation of a term with its definitions.
    pub async fn get_term_read(&self, term_id: Uuid) -> Result<TermRead> {
        let term = self
            .terms
            .get(term_id)
            .await?
            .ok_or(Error::TermNotFound(term_id))?;
        let definitions = self.terms.get_definitions(term.id).await?;

        Ok(TermRead {
            id: term.id,
            text: term.text,
            discoverable: term.discoverable,
            definitions,
        })
    }

    /// Delete a term; definition associations are cleared first.
    pub async fn delete_term(&self, term_id: Uuid) -> Result<()> {
        if self.terms.get(term_id).await?.is_none() {
            return Err(Error::TermNotFound(term_id));
        }
        self.terms.set_definitions(term_id, &[]).await?;
        self.terms.delete(term_id).await
    }

    async fn upsert_definitions(&self, definitions: &[DefinitionCreate]) -> Result<Vec<Uuid>> {
        let mut ids = Vec::with_capacity(definitions.len());
        for definition_in in definitions {
            ids.push(self.upsert_definition(definition_in).await?.id);
        }
        Ok(ids)
    }
}
