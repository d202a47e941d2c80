//! The sites reducer: `(state, action) -> state'`

use crate::action::{Action, ClearDataDetail, SiteDetails};
use crate::history::HistoryService;
use crate::site::SiteDetail;
use crate::sites::{Reparent, Sites};
use crate::state::AppState;
use sites_core::{ReducerConfig, SiteKey, SiteTag, SitesError, SitesResult};
use std::sync::Arc;

/// Result of a reduction together with everything that was rejected on the way
#[derive(Debug)]
pub struct Reduction {
    pub state: AppState,
    pub rejected: Vec<SitesError>,
}

impl Reduction {
    fn unchanged(state: &AppState) -> Self {
        Self {
            state: state.clone(),
            rejected: Vec::new(),
        }
    }
}

/// Applies site actions to application state.
///
/// The reducer holds no state of its own between calls. The only side effect
/// is asking the [`HistoryService`] to clear history.
pub struct SitesReducer {
    history: Arc<dyn HistoryService>,
    config: ReducerConfig,
}

impl SitesReducer {
    pub fn new(history: Arc<dyn HistoryService>, config: ReducerConfig) -> Self {
        Self { history, config }
    }

    pub fn with_history(history: Arc<dyn HistoryService>) -> Self {
        Self::new(history, ReducerConfig::default())
    }

    /// Apply `action` to `state`. Rejected payload elements are logged and
    /// otherwise ignored; `state` itself is never modified.
    pub fn reduce(&self, state: &AppState, action: &Action) -> AppState {
        let Reduction { state, rejected } = self.reduce_with_report(state, action);
        for error in &rejected {
            log::warn!("{} rejected: {}", action.name(), error);
        }
        state
    }

    /// Like [`SitesReducer::reduce`], also returning what was rejected
    pub fn reduce_with_report(&self, state: &AppState, action: &Action) -> Reduction {
        match action {
            Action::AddSite {
                site_detail,
                tag,
                original_site_detail,
                destination_detail,
                skip_sync,
            } => {
                log::debug!(
                    "Adding {} site(s), skip_sync={}",
                    site_detail.as_slice().len(),
                    skip_sync
                );
                self.add_site(
                    state,
                    site_detail,
                    *tag,
                    original_site_detail.as_ref(),
                    destination_detail.as_ref(),
                )
            }
            Action::RemoveSite {
                site_detail, tag, ..
            } => self.remove_site(state, site_detail, *tag),
            Action::MoveSite {
                source_key,
                destination_key,
                prepend,
                destination_is_parent,
            } => self.move_site(
                state,
                source_key,
                destination_key,
                *prepend,
                *destination_is_parent,
            ),
            Action::OnClearBrowsingData { clear_data_detail } => {
                self.clear_browsing_data(state, clear_data_detail)
            }
            Action::Unknown => Reduction::unchanged(state),
        }
    }

    fn add_site(
        &self,
        state: &AppState,
        site_detail: &SiteDetails,
        tag: Option<SiteTag>,
        original: Option<&SiteDetail>,
        destination: Option<&SiteDetail>,
    ) -> Reduction {
        let mut sites = state.sites().clone();
        let mut rejected = Vec::new();

        match site_detail {
            SiteDetails::Many(details) => {
                if original.is_some() || destination.is_some() {
                    rejected.push(SitesError::invalid_detail(
                        "originalSiteDetail and destinationDetail need a single site detail",
                    ));
                }
                for detail in details {
                    if let Err(error) = sites.add(detail, tag, None) {
                        rejected.push(error);
                    }
                }
            }
            SiteDetails::One(detail) => {
                let detail = with_folder_id(&sites, detail, tag, original);
                match sites.add(&detail, tag, original) {
                    Ok(key) => {
                        if let Some(destination) = destination {
                            if let Err(error) = place_after(&mut sites, &key, destination) {
                                rejected.push(error);
                            }
                        }
                    }
                    Err(error) => rejected.push(error),
                }
            }
        }

        Reduction {
            state: state.with_sites(sites),
            rejected,
        }
    }

    fn remove_site(
        &self,
        state: &AppState,
        detail: &SiteDetail,
        tag: Option<SiteTag>,
    ) -> Reduction {
        let mut sites = state.sites().clone();
        match sites.remove(detail, tag) {
            Ok(true) => Reduction {
                state: state.with_sites(sites),
                rejected: Vec::new(),
            },
            Ok(false) => Reduction::unchanged(state),
            Err(error) => Reduction {
                state: state.clone(),
                rejected: vec![error],
            },
        }
    }

    fn move_site(
        &self,
        state: &AppState,
        source: &SiteKey,
        destination: &SiteKey,
        prepend: bool,
        destination_is_parent: bool,
    ) -> Reduction {
        let reparent = if destination_is_parent {
            Reparent::IntoDestination
        } else {
            Reparent::AlongsideDestination
        };

        let mut sites = state.sites().clone();
        match sites.move_site(source, destination, prepend, reparent) {
            Ok(Some(key)) => {
                log::debug!("Moved {} next to {} as {}", source, destination, key);
                Reduction {
                    state: state.with_sites(sites),
                    rejected: Vec::new(),
                }
            }
            Ok(None) => Reduction::unchanged(state),
            Err(error) => Reduction {
                state: state.clone(),
                rejected: vec![error],
            },
        }
    }

    fn clear_browsing_data(&self, state: &AppState, detail: &ClearDataDetail) -> Reduction {
        if !detail.browser_history {
            return Reduction::unchanged(state);
        }

        let mut sites = state.sites().clone();
        if self.config.purge_history_on_clear {
            let purged = sites.clear_history();
            log::info!("Cleared browsing history, {} site(s) removed", purged);
        }
        self.history.clear_history();

        Reduction {
            state: state.with_sites(sites),
            rejected: Vec::new(),
        }
    }
}

/// Folder descriptors without an id keep the id of the folder they edit, new
/// folders get the next free one
fn with_folder_id(
    sites: &Sites,
    detail: &SiteDetail,
    tag: Option<SiteTag>,
    original: Option<&SiteDetail>,
) -> SiteDetail {
    let is_folder = tag.or(detail.tag).is_some_and(SiteTag::is_folder);
    if !is_folder || detail.folder_id.is_some() {
        return detail.clone();
    }

    let edited = original
        .and_then(|original| original.key().ok())
        .and_then(|key| sites.get(key.as_str()))
        .and_then(|record| record.folder_id);
    detail
        .clone()
        .with_folder_id(edited.unwrap_or_else(|| sites.next_folder_id()))
}

/// Put a freshly added record right after `destination`, keeping its folder
fn place_after(sites: &mut Sites, key: &SiteKey, destination: &SiteDetail) -> SitesResult<()> {
    let destination_key = destination.key()?;
    sites.move_site(key, &destination_key, false, Reparent::Keep)?;
    Ok(())
}
