/// Everything the front ends show for one document, computed in one go.
use crate::{
    minimize_hostevents, CluesData, Criteria, Dataset, Document, HostAreaStats, StateCode,
    StatesSummary, TimeWindow,
};

use anyhow::Result;
use std::collections::BTreeMap;
use ustr::Ustr;

#[derive(Debug, Clone)]
pub struct Report {
    pub data: CluesData,
    pub state_series: Dataset<StateCode>,
    pub states: BTreeMap<Ustr, StatesSummary>,
    pub usage: BTreeMap<Ustr, HostAreaStats>,

    /// Events dropped by minimization, zero if it was not requested.
    pub skipped: usize,
}

impl Report {
    /// Build the report for `document`.  Bounds in `window` override the document's own window.
    /// With `minimize`, host events are minimized under the given criteria before normalization.

    pub fn build(document: Document, window: &TimeWindow, minimize: Option<Criteria>) -> Result<Report> {
        let Document {
            mut hostevents,
            window: doc_window,
        } = document;
        let skipped = match minimize {
            Some(criteria) => minimize_hostevents(&mut hostevents, criteria),
            None => 0,
        };
        let data = CluesData::new(hostevents, &doc_window.or(*window))?;
        let usage = data.hosts_stats()?;
        Ok(Report {
            state_series: data.state_change_series(),
            states: data.states_stats(),
            usage,
            skipped,
            data,
        })
    }
}
