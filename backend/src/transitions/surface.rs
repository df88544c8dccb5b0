//! Transition surface: dense (age × archetype) table of base parameters
//!
//! Built once per run by querying the risk vector source for every age in
//! `0..=max_age` and every archetype in catalog order. Lookups are O(1);
//! ages past `max_age` clamp to `max_age`.

use crate::risk::{ArchetypeCatalog, RiskVectorSource, TransitionParams};

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionSurface {
    max_age: usize,
    n_archetypes: usize,
    /// Row-major: `cells[age * n_archetypes + archetype]`
    cells: Vec<TransitionParams>,
}

impl TransitionSurface {
    /// Materialize the surface from a risk vector source
    ///
    /// Parameters outside [0, 1] are clamped as they are stored.
    ///
    /// # Example
    /// ```
    /// use loan_tape_core_rs::risk::{ReferenceArchetypeModel, RiskVectorSource};
    /// use loan_tape_core_rs::transitions::TransitionSurface;
    ///
    /// let model = ReferenceArchetypeModel::new();
    /// let catalog = model.archetype_catalog();
    /// let surface = TransitionSurface::build(&model, &catalog, 60);
    ///
    /// // Ages beyond the modeled maximum reuse the last row
    /// assert_eq!(surface.get(500, 0), surface.get(60, 0));
    /// ```
    pub fn build<S>(source: &S, catalog: &ArchetypeCatalog, max_age: usize) -> Self
    where
        S: RiskVectorSource + ?Sized,
    {
        let n_archetypes = catalog.len();
        let mut cells = Vec::with_capacity((max_age + 1) * n_archetypes);

        for age in 0..=max_age {
            for label in catalog.labels() {
                cells.push(source.base_transition_parameters(label, age).clamped());
            }
        }

        Self {
            max_age,
            n_archetypes,
            cells,
        }
    }

    pub fn max_age(&self) -> usize {
        self.max_age
    }

    pub fn n_archetypes(&self) -> usize {
        self.n_archetypes
    }

    /// Parameters of one archetype at one age (age clamped to `max_age`)
    ///
    /// # Panics
    /// Panics if `archetype` is outside the catalog.
    pub fn get(&self, age: usize, archetype: usize) -> &TransitionParams {
        assert!(archetype < self.n_archetypes, "archetype index out of range");
        &self.row(age)[archetype]
    }

    /// All archetypes at one age, in catalog order (age clamped to `max_age`)
    pub fn row(&self, age: usize) -> &[TransitionParams] {
        let age = age.min(self.max_age);
        let start = age * self.n_archetypes;
        &self.cells[start..start + self.n_archetypes]
    }
}
