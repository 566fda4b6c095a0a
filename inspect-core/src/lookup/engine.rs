use tracing::debug;

use crate::error::{FetchError, LookupError};
use crate::lookup::fetcher::{LogSource, PageFetcher, PageResult};
use crate::lookup::model::{
    FilterPolicy, LookupEvent, LookupKind, LookupOutcome, NoDataCategory, TargetIdentity,
};
use crate::lookup::parser::{LogLineParser, ParsedRecord, parse_age_hours};

/// Filter-aware pagination over the log source.
///
/// The log source numbers its pages before our age/actor filters run, so a
/// page it calls "3 of 5" may be empty for us. Every lookup therefore walks
/// the pages from 1 to find the real end, then fetches the requested page a
/// second time to render it. Nothing is cached between the two passes or
/// between lookups.
#[derive(Debug)]
pub struct PaginationEngine<S> {
    fetcher: PageFetcher<S>,
    parser: LogLineParser,
    history_limit_page: u32,
}

impl<S: LogSource> PaginationEngine<S> {
    pub fn new(fetcher: PageFetcher<S>, parser: LogLineParser, history_limit_page: u32) -> Self {
        Self {
            fetcher,
            parser,
            history_limit_page,
        }
    }

    pub fn fetcher(&self) -> &PageFetcher<S> {
        &self.fetcher
    }

    pub fn history_limit_page(&self) -> u32 {
        self.history_limit_page
    }

    /// First page (1-based) whose rows all fail the age test.
    ///
    /// Actor exclusion is not applied here, only age. The loop has no cap of
    /// its own; it ends when the source runs out of rows.
    pub fn discover_max_page(
        &self,
        kind: LookupKind,
        target: &TargetIdentity,
        filter: &FilterPolicy,
    ) -> Result<u32, FetchError> {
        let mut page: u32 = 1;

        loop {
            let result = self.fetcher.fetch(kind, target, page)?;
            let survivors = self.count_survivors(&result.lines, filter);
            debug!(kind = ?kind, page, survivors, "discovery step");

            if survivors == 0 {
                return Ok(page);
            }
            page = page.saturating_add(1);
        }
    }

    /// Rows on a page that pass the age test.
    pub fn count_survivors(&self, lines: &[String], filter: &FilterPolicy) -> usize {
        lines
            .iter()
            .map(|line| self.parser.parse(line))
            .filter(|record| {
                matches!(record, ParsedRecord::DataRow { .. })
                    && filter.admits_age(record.age_hours())
            })
            .count()
    }

    /// Discover, validate, render.
    pub fn lookup(
        &self,
        kind: LookupKind,
        target: &TargetIdentity,
        filter: &FilterPolicy,
        page: u32,
    ) -> Result<LookupOutcome, LookupError> {
        check_page_quota(page, self.history_limit_page)?;

        let max_page = self.discover_max_page(kind, target, filter)?;
        if page >= max_page {
            return Err(LookupError::QuotaExceeded {
                requested: page,
                limit: max_page,
            });
        }

        let result = self.fetcher.fetch(kind, target, page)?;
        Ok(self.render(result, filter, max_page))
    }

    fn render(&self, result: PageResult, filter: &FilterPolicy, max_page: u32) -> LookupOutcome {
        let final_max_page = (max_page - 1).min(self.history_limit_page);
        let mut events = Vec::new();
        let mut empty = true;

        for line in &result.lines {
            match self.parser.parse(line) {
                ParsedRecord::NoData {
                    category,
                    target_label,
                } => {
                    // Categories we don't know are dropped.
                    if let Some(category) = NoDataCategory::from_source(&category) {
                        events.push(LookupEvent::NoData {
                            category,
                            target: target_label,
                        });
                    }
                }
                ParsedRecord::SectionHeader { x, y, z, .. } => {
                    events.push(LookupEvent::Header { x, y, z });
                }
                ParsedRecord::DataRow {
                    time_value,
                    actor_name,
                    action_label,
                    block_label,
                    ..
                } => {
                    let actor = actor_name.trim();
                    let age = parse_age_hours(&time_value);
                    if filter.excludes_actor(actor) || !filter.admits_age(age) {
                        continue;
                    }

                    empty = false;
                    events.push(LookupEvent::Row {
                        time: time_value.trim().to_string(),
                        actor: actor.to_string(),
                        action: action_label.trim().to_string(),
                        block: block_label.trim().to_string(),
                    });
                }
                ParsedRecord::PageFooter {
                    raw_page_number, ..
                } => {
                    events.push(LookupEvent::Footer {
                        page: raw_page_number.max(1),
                        max_page: final_max_page,
                    });
                }
                ParsedRecord::Unrecognized => {}
            }
        }

        if empty {
            events = vec![LookupEvent::EmptyPage];
        }

        LookupOutcome {
            events,
            final_page: result.page_index_requested,
            final_max_page,
            is_empty: empty,
        }
    }
}

/// Page-number checks that need no I/O.
pub fn check_page_quota(page: u32, history_limit_page: u32) -> Result<(), LookupError> {
    if page == 0 {
        return Err(LookupError::InvalidPage);
    }
    if history_limit_page <= page {
        return Err(LookupError::QuotaExceeded {
            requested: page,
            limit: history_limit_page,
        });
    }
    Ok(())
}
