//! Discovery of option contracts and optionable roots from an OPRA
//! definition replay.
//!
//! A discovery client subscribes to the `definition` schema for every parent
//! symbol in intraday-replay mode, then consumes the stream on a worker
//! thread: symbol mappings populate an insertion-sorted table of option
//! roots, security definitions populate an instrument-ID index, and once the
//! gateway signals the end of the replay the two are cross-referenced.

use std::{
    cmp::Ordering as CmpOrdering,
    sync::{
        atomic::{AtomicBool, AtomicU8, Ordering},
        Arc, Mutex, OnceLock,
    },
    thread::{self, JoinHandle},
};

use log::{debug, info};
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{
    datasets,
    enums::{rtype, SType, Schema},
    error::{Error, Result},
    live::{Session, SessionHandler, ALL_SYMBOLS},
    osi::OsiSymbol,
    record::{ErrorMsg, InstrumentDefMsg, SymbolMappingMsg, SystemMsg},
    record_ref::RecordRef,
};

/// The number of buckets in the instrument-ID to definition index.
///
/// There are approx. 7,000 optionable symbols as of this writing. Some have
/// as few as 100 options available, and others have many thousands. Anything
/// from 25,000 to 100,000 is a decent choice for the number of buckets.
const NUM_DEF_BUCKETS: usize = 50_000;

/// The system message the gateway sends once the intraday replay of
/// instrument definitions is complete.
const DEFINITION_REPLAY_DONE: &str = "Finished definition replay";

/// The progress of a discovery client. Advances monotonically except for
/// [`Error`](Self::Error), which is reachable from every state but
/// [`Done`](Self::Done).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum DiscoveryState {
    /// Initialized but not connected yet.
    #[default]
    NotStarted = 0,
    /// Connected and authenticated; the worker is subscribing.
    Connected,
    /// Subscribed; definitions and mappings may be arriving.
    Subscribed,
    /// The replay finished; the worker is cross-referencing definitions to
    /// options.
    Xref,
    /// Finished; the results are available.
    Done,
    /// The client errored out; see [`OpraDiscovery::error`].
    Error,
}

/// One discovered option contract.
#[derive(Clone, Copy, Debug)]
pub struct DiscoveredOption {
    /// The instrument ID, only stable within the same trading day.
    pub instrument_id: u32,
    /// The decoded OSI contract symbol.
    pub symbol: OsiSymbol,
    /// The slot of the matching definition within the instrument ID's
    /// bucket, resolved by the cross-reference pass.
    sdef_slot: Option<usize>,
}

impl DiscoveredOption {
    /// Returns `true` if the cross-reference pass matched this option to a
    /// security definition.
    pub fn has_definition(&self) -> bool {
        self.sdef_slot.is_some()
    }
}

/// A discovered optionable root and its contracts.
#[derive(Clone, Debug)]
pub struct DiscoveredRoot {
    root: String,
    options: Vec<DiscoveredOption>,
}

impl DiscoveredRoot {
    /// Returns the root symbol without any suffix, e.g. `"MSFT"` or
    /// `"SPY"`.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Returns the option contracts discovered for this root.
    pub fn options(&self) -> &[DiscoveredOption] {
        &self.options
    }
}

/// Appends to a sequence that grows by doubling from `initial` capacity.
fn push_doubling<T>(vec: &mut Vec<T>, initial: usize, value: T) {
    if vec.len() == vec.capacity() {
        let additional = if vec.capacity() == 0 {
            initial
        } else {
            vec.capacity()
        };
        vec.reserve_exact(additional);
    }
    vec.push(value);
}

/// The instrument-ID to security definition index: a fixed bucket table
/// keyed by `instrument_id % NUM_DEF_BUCKETS`, with no deletion.
struct DefIndex {
    buckets: Vec<Vec<InstrumentDefMsg>>,
}

impl Default for DefIndex {
    fn default() -> Self {
        Self {
            buckets: (0..NUM_DEF_BUCKETS).map(|_| Vec::new()).collect(),
        }
    }
}

impl DefIndex {
    fn bucket_index(instrument_id: u32) -> usize {
        instrument_id as usize % NUM_DEF_BUCKETS
    }

    fn insert(&mut self, def: InstrumentDefMsg) {
        let bucket = &mut self.buckets[Self::bucket_index(def.hd.instrument_id)];
        push_doubling(bucket, 4, def);
    }

    /// Scans the bucket for `instrument_id` and returns the slot of the
    /// first exact match.
    fn find_slot(&self, instrument_id: u32) -> Option<usize> {
        self.buckets[Self::bucket_index(instrument_id)]
            .iter()
            .position(|def| def.hd.instrument_id == instrument_id)
    }

    fn get(&self, instrument_id: u32, slot: usize) -> Option<&InstrumentDefMsg> {
        self.buckets[Self::bucket_index(instrument_id)].get(slot)
    }
}

/// Searches the sorted roots for `root` with a halving step. Returns the
/// matching or insertion index and whether an insertion is needed.
fn find_insertion_point(roots: &[DiscoveredRoot], root: &str) -> (usize, bool) {
    if roots.is_empty() {
        return (0, true);
    }
    let count = roots.len();
    // Sentinel: no previous index until the first step is taken.
    let mut last_index = usize::MAX;
    let mut index = count / 2;
    let mut step = count / 2;
    loop {
        match root.cmp(roots[index].root()) {
            CmpOrdering::Equal => return (index, false),
            CmpOrdering::Less => {
                if index == 0 {
                    return (0, true);
                }
                if last_index == index - 1 {
                    // Just stepped right by one; this is the insertion point.
                    return (index, true);
                }
                last_index = index;
                step /= 2;
                if step == 0 {
                    step = 1;
                }
                index = index.saturating_sub(step);
            }
            CmpOrdering::Greater => {
                if index == count - 1 {
                    return (count, true);
                }
                if last_index == index + 1 {
                    // Just stepped left by one; insert after this element.
                    return (index + 1, true);
                }
                last_index = index;
                step /= 2;
                if step == 0 {
                    step = 1;
                }
                index += step;
                if index >= count {
                    index = count - 1;
                }
            }
        }
    }
}

/// The tables built during discovery. Owned by the worker while the stream
/// is live; published as [`DiscoveryResults`] once the worker finishes.
#[derive(Default)]
struct DiscoveryTables {
    roots: Vec<DiscoveredRoot>,
    defs: DefIndex,
    num_options: usize,
    num_defs: usize,
}

impl DiscoveryTables {
    /// Files the mapped-to symbol under its root, inserting the root into
    /// the sorted table if this is its first option. Mappings whose output
    /// symbol is not a valid OSI contract are discarded.
    fn on_symbol_mapping(&mut self, smap: &SymbolMappingMsg) {
        let Ok(symbol) = smap.stype_out_symbol() else {
            return;
        };
        let Ok(osi) = OsiSymbol::parse(symbol) else {
            return;
        };
        let Ok(root) = osi.root() else {
            return;
        };
        let (index, insertion_needed) = find_insertion_point(&self.roots, root);
        if insertion_needed {
            self.roots.insert(
                index,
                DiscoveredRoot {
                    root: root.to_owned(),
                    options: Vec::new(),
                },
            );
        }
        push_doubling(
            &mut self.roots[index].options,
            64,
            DiscoveredOption {
                instrument_id: smap.hd.instrument_id,
                symbol: osi,
                sdef_slot: None,
            },
        );
        self.num_options += 1;
    }

    fn on_instrument_def(&mut self, sdef: &InstrumentDefMsg) {
        self.defs.insert(*sdef);
        self.num_defs += 1;
    }

    /// Attaches each option's security definition by scanning the bucket for
    /// its instrument ID. Runs single-threaded on the worker with no
    /// concurrent mutation.
    fn xref(&mut self) {
        let Self { roots, defs, .. } = self;
        for root in roots.iter_mut() {
            for option in root.options.iter_mut() {
                option.sdef_slot = defs.find_slot(option.instrument_id);
            }
        }
    }
}

/// The outcome of a completed discovery run.
pub struct DiscoveryResults {
    tables: DiscoveryTables,
}

impl DiscoveryResults {
    /// Returns the discovered roots, sorted by root symbol.
    pub fn roots(&self) -> &[DiscoveredRoot] {
        &self.tables.roots
    }

    /// Returns the security definition cross-referenced to `option`, or
    /// `None` if no definition with its instrument ID was received.
    pub fn definition(&self, option: &DiscoveredOption) -> Option<&InstrumentDefMsg> {
        self.tables
            .defs
            .get(option.instrument_id, option.sdef_slot?)
    }

    /// Returns the total number of options discovered.
    pub fn num_options(&self) -> usize {
        self.tables.num_options
    }

    /// Returns the total number of security definitions received.
    pub fn num_defs(&self) -> usize {
        self.tables.num_defs
    }
}

struct DiscoveryShared {
    state: AtomicU8,
    stop: AtomicBool,
    error: OnceLock<String>,
    results: Mutex<Option<DiscoveryResults>>,
}

impl DiscoveryShared {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(DiscoveryState::NotStarted.into()),
            stop: AtomicBool::new(false),
            error: OnceLock::new(),
            results: Mutex::new(None),
        }
    }

    fn state(&self) -> DiscoveryState {
        DiscoveryState::try_from(self.state.load(Ordering::Acquire))
            .unwrap_or(DiscoveryState::Error)
    }

    fn advance(&self, state: DiscoveryState) {
        self.state.store(state.into(), Ordering::Release);
    }

    fn fail(&self, message: String) {
        let _ = self.error.set(message);
        self.advance(DiscoveryState::Error);
    }
}

/// The session handler of the discovery worker: owns the tables and applies
/// each record to them.
struct DiscoveryHandler {
    shared: Arc<DiscoveryShared>,
    tables: DiscoveryTables,
}

impl SessionHandler for DiscoveryHandler {
    fn on_record(&mut self, record: RecordRef) {
        match record.header().rtype {
            rtype::SYMBOL_MAPPING => {
                if let Some(smap) = record.get::<SymbolMappingMsg>() {
                    self.tables.on_symbol_mapping(smap);
                }
            }
            rtype::INSTRUMENT_DEF => {
                if let Some(sdef) = record.get::<InstrumentDefMsg>() {
                    self.tables.on_instrument_def(sdef);
                }
            }
            rtype::SYSTEM => {
                if let Some(smsg) = record.get::<SystemMsg>() {
                    if smsg.msg().is_ok_and(|msg| msg == DEFINITION_REPLAY_DONE) {
                        debug!("Definition replay finished, cross-referencing");
                        self.shared.advance(DiscoveryState::Xref);
                    }
                }
            }
            rtype::ERROR => {
                if let Some(emsg) = record.get::<ErrorMsg>() {
                    self.shared
                        .fail(emsg.err().unwrap_or_default().to_owned());
                }
            }
            _ => {}
        }
    }

    fn on_error(&mut self, error: &Error) {
        if error.is_fatal() {
            self.shared.fail(error.to_string());
        }
    }
}

/// A client wrapper that discovers the option contracts and optionable
/// roots of the OPRA dataset.
///
/// Instrument IDs are only stable within a trading day; discard the client
/// and rebuild across days.
#[derive(Default)]
pub struct OpraDiscovery {
    shared: Option<Arc<DiscoveryShared>>,
    worker: Option<JoinHandle<()>>,
}

impl OpraDiscovery {
    /// Creates a new discovery client, but doesn't connect yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects to the OPRA gateway with `api_key` and starts discovering on
    /// a worker thread. Poll [`state`](Self::state) for progress and collect
    /// the outcome with [`take_results`](Self::take_results) once it reports
    /// [`DiscoveryState::Done`].
    ///
    /// # Errors
    /// This function returns an error if called twice, if the connection or
    /// handshake fails, or if the worker thread can't be spawned.
    pub fn start(&mut self, api_key: &str) -> Result<()> {
        if self.shared.is_some() {
            return Err(Error::bad_argument("discovery", "already started"));
        }
        let shared = Arc::new(DiscoveryShared::new());
        self.shared = Some(Arc::clone(&shared));

        let mut session = Session::new(DiscoveryHandler {
            shared: Arc::clone(&shared),
            tables: DiscoveryTables::default(),
        });
        session.connect(api_key, datasets::OPRA_PILLAR, false)?;
        shared.advance(DiscoveryState::Connected);

        self.worker = Some(
            thread::Builder::new()
                .name("lsg-discover".to_owned())
                .spawn(move || worker(session, shared))
                .map_err(|e| Error::io(e, "spawning discovery worker"))?,
        );
        Ok(())
    }

    /// Returns the current discovery state.
    pub fn state(&self) -> DiscoveryState {
        self.shared
            .as_ref()
            .map_or(DiscoveryState::NotStarted, |shared| shared.state())
    }

    /// Returns the error message if the state is
    /// [`DiscoveryState::Error`].
    pub fn error(&self) -> Option<&str> {
        self.shared
            .as_ref()
            .and_then(|shared| shared.error.get())
            .map(String::as_str)
    }

    /// Takes the discovery results. Returns `Some` exactly once, after the
    /// state has reached [`DiscoveryState::Done`].
    pub fn take_results(&mut self) -> Option<DiscoveryResults> {
        let shared = self.shared.as_ref()?;
        if shared.state() != DiscoveryState::Done {
            return None;
        }
        shared.results.lock().ok()?.take()
    }

    /// Stops the worker at its next receive boundary, joins it, and closes
    /// the underlying session. Safe to call from any state.
    pub fn close(&mut self) {
        if let Some(shared) = self.shared.as_ref() {
            shared.stop.store(true, Ordering::Release);
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for OpraDiscovery {
    fn drop(&mut self) {
        self.close();
    }
}

/// The discovery worker: subscribes to the definition replay, drives the
/// receive loop until the replay finishes, then cross-references and
/// publishes the results. The session is closed when the worker returns.
fn worker(mut session: Session<DiscoveryHandler>, shared: Arc<DiscoveryShared>) {
    let symbols = vec![ALL_SYMBOLS.to_owned()];
    if session
        .start(Schema::Definition, SType::Parent, &symbols, "", true)
        .is_err()
    {
        // The handler already recorded the error state.
        return;
    }
    shared.advance(DiscoveryState::Subscribed);

    while !shared.stop.load(Ordering::Acquire) && shared.state() == DiscoveryState::Subscribed {
        if session.get().is_err() {
            return;
        }
    }
    if shared.state() != DiscoveryState::Xref {
        // Stopped or errored out before the replay finished.
        return;
    }

    let mut tables = std::mem::take(&mut session.handler_mut().tables);
    tables.xref();
    info!(
        "Discovered {} options across {} roots ({} definitions)",
        tables.num_options,
        tables.roots.len(),
        tables.num_defs
    );
    if let Ok(mut results) = shared.results.lock() {
        *results = Some(DiscoveryResults { tables });
    }
    shared.advance(DiscoveryState::Done);
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::record::RecordHeader;

    use super::*;

    fn root_table(roots: &[&str]) -> Vec<DiscoveredRoot> {
        roots
            .iter()
            .map(|root| DiscoveredRoot {
                root: (*root).to_owned(),
                options: Vec::new(),
            })
            .collect()
    }

    fn smap(instrument_id: u32, osi: &str) -> SymbolMappingMsg {
        SymbolMappingMsg::new(instrument_id, 0, "parent", osi, 0, 0).unwrap()
    }

    fn sdef(instrument_id: u32) -> InstrumentDefMsg {
        InstrumentDefMsg {
            hd: RecordHeader::new::<InstrumentDefMsg>(rtype::INSTRUMENT_DEF, 0, instrument_id, 0),
            ..Default::default()
        }
    }

    #[rstest]
    #[case::empty(&[], "MSFT", 0, true)]
    #[case::before_single(&["MSFT"], "AAPL", 0, true)]
    #[case::after_single(&["MSFT"], "TSLA", 1, true)]
    #[case::equal_single(&["MSFT"], "MSFT", 0, false)]
    #[case::front(&["B", "D", "F", "H"], "A", 0, true)]
    #[case::back(&["B", "D", "F", "H"], "Z", 4, true)]
    #[case::between(&["B", "D", "F", "H"], "E", 2, true)]
    #[case::existing_first(&["B", "D", "F", "H"], "B", 0, false)]
    #[case::existing_last(&["B", "D", "F", "H"], "H", 3, false)]
    #[case::before_both_of_two(&["B", "D"], "A", 0, true)]
    #[case::existing_first_of_three(&["B", "D", "F"], "B", 0, false)]
    fn insertion_point(
        #[case] roots: &[&str],
        #[case] root: &str,
        #[case] exp_index: usize,
        #[case] exp_needed: bool,
    ) {
        let table = root_table(roots);
        assert_eq!(find_insertion_point(&table, root), (exp_index, exp_needed));
    }

    #[test]
    fn insertion_keeps_roots_sorted() {
        let mut tables = DiscoveryTables::default();
        for (id, root) in ["MSFT", "AAPL", "TSLA", "AAPL", "SPY"].iter().enumerate() {
            tables.on_symbol_mapping(&smap(id as u32, &format!("{root:<6}250815C00100000")));
        }
        let roots: Vec<&str> = tables.roots.iter().map(DiscoveredRoot::root).collect();
        assert_eq!(roots, vec!["AAPL", "MSFT", "SPY", "TSLA"]);
        assert!(tables
            .roots
            .windows(2)
            .all(|pair| pair[0].root() < pair[1].root()));
        assert_eq!(tables.num_options, 5);
    }

    #[test]
    fn reobserved_root_gains_an_option() {
        let mut tables = DiscoveryTables::default();
        tables.on_symbol_mapping(&smap(1, "AAPL  250815C00100000"));
        tables.on_symbol_mapping(&smap(2, "MSFT  250815C00100000"));
        tables.on_symbol_mapping(&smap(3, "AAPL  250815P00100000"));
        assert_eq!(tables.roots.len(), 2);
        assert_eq!(tables.roots[0].root(), "AAPL");
        assert_eq!(tables.roots[0].options().len(), 2);
        assert_eq!(tables.roots[1].options().len(), 1);
    }

    #[test]
    fn non_osi_mappings_are_discarded() {
        let mut tables = DiscoveryTables::default();
        tables.on_symbol_mapping(&smap(1, "AAPL"));
        assert!(tables.roots.is_empty());
        assert_eq!(tables.num_options, 0);
    }

    #[test]
    fn options_grow_by_doubling_from_64() {
        let mut tables = DiscoveryTables::default();
        tables.on_symbol_mapping(&smap(0, "SPY   250815C00100000"));
        assert_eq!(tables.roots[0].options.capacity(), 64);
        for id in 1..65 {
            tables.on_symbol_mapping(&smap(id, "SPY   250815C00100000"));
        }
        assert_eq!(tables.roots[0].options.capacity(), 128);
    }

    #[test]
    fn buckets_grow_by_doubling_from_4() {
        let mut defs = DefIndex::default();
        for i in 0..5 {
            defs.insert(sdef(i * NUM_DEF_BUCKETS as u32));
        }
        assert_eq!(defs.buckets[0].len(), 5);
        assert_eq!(defs.buckets[0].capacity(), 8);
    }

    #[test]
    fn xref_attaches_matching_definitions() {
        let mut tables = DiscoveryTables::default();
        tables.on_symbol_mapping(&smap(10, "AAPL  250815C00100000"));
        tables.on_symbol_mapping(&smap(20, "AAPL  250815P00100000"));
        tables.on_symbol_mapping(&smap(30, "MSFT  250815C00100000"));
        // A colliding ID in the same bucket as 10, and no definition for 30.
        tables.on_instrument_def(&sdef(10 + NUM_DEF_BUCKETS as u32));
        tables.on_instrument_def(&sdef(10));
        tables.on_instrument_def(&sdef(20));
        tables.xref();

        let results = DiscoveryResults { tables };
        let aapl = &results.roots()[0];
        for option in aapl.options() {
            assert!(option.has_definition());
            let def = results.definition(option).unwrap();
            assert_eq!({ def.hd.instrument_id }, option.instrument_id);
        }
        let msft_option = &results.roots()[1].options()[0];
        assert!(!msft_option.has_definition());
        assert!(results.definition(msft_option).is_none());
        assert_eq!(results.num_defs(), 3);
    }

    #[test]
    fn replay_done_system_message_advances_state() {
        let shared = Arc::new(DiscoveryShared::new());
        shared.advance(DiscoveryState::Subscribed);
        let mut handler = DiscoveryHandler {
            shared: Arc::clone(&shared),
            tables: DiscoveryTables::default(),
        };
        let heartbeat = SystemMsg::new(0, "Heartbeat").unwrap();
        // Safety: `heartbeat` is a complete record.
        handler.on_record(unsafe { RecordRef::new(heartbeat.as_ref()) });
        assert_eq!(shared.state(), DiscoveryState::Subscribed);

        let done = SystemMsg::new(0, DEFINITION_REPLAY_DONE).unwrap();
        // Safety: `done` is a complete record.
        handler.on_record(unsafe { RecordRef::new(done.as_ref()) });
        assert_eq!(shared.state(), DiscoveryState::Xref);
    }

    #[test]
    fn gateway_error_record_fails_discovery() {
        let shared = Arc::new(DiscoveryShared::new());
        shared.advance(DiscoveryState::Subscribed);
        let mut handler = DiscoveryHandler {
            shared: Arc::clone(&shared),
            tables: DiscoveryTables::default(),
        };
        let emsg = ErrorMsg::new(0, "Subscription limit exceeded");
        // Safety: `emsg` is a complete record.
        handler.on_record(unsafe { RecordRef::new(emsg.as_ref()) });
        assert_eq!(shared.state(), DiscoveryState::Error);
        assert_eq!(
            shared.error.get().map(String::as_str),
            Some("Subscription limit exceeded")
        );
    }

    #[test]
    fn fatal_session_errors_fail_discovery_once() {
        let shared = Arc::new(DiscoveryShared::new());
        let mut handler = DiscoveryHandler {
            shared: Arc::clone(&shared),
            tables: DiscoveryTables::default(),
        };
        handler.on_error(&Error::Gateway("transient".to_owned()));
        assert_eq!(shared.state(), DiscoveryState::NotStarted);
        handler.on_error(&Error::ConnectionLost);
        assert_eq!(shared.state(), DiscoveryState::Error);
        // The first recorded error sticks.
        handler.on_error(&Error::BufferOverflow);
        assert_eq!(
            shared.error.get().map(String::as_str),
            Some("connection closed unexpectedly")
        );
    }

    #[test]
    fn unstarted_discovery_reports_not_started() {
        let mut discovery = OpraDiscovery::new();
        assert_eq!(discovery.state(), DiscoveryState::NotStarted);
        assert!(discovery.error().is_none());
        assert!(discovery.take_results().is_none());
        discovery.close();
    }
}
