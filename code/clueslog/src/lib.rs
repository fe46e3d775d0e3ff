/// A CLUES report is a JSON document holding, for every host in a cluster managed by the CLUES power
/// manager, the *host events* recorded by the monitor: the host's power state, the slots and memory
/// it offers, and the slots and memory in use, each observation tagged with a time in seconds.
///
/// Hosts are sampled independently and irregularly: a host that does not change may not be
/// reported for hours, and a busy host may be reported many times a minute.  Observations of
/// different hosts are not aligned in time.  The value of a host's quantities between two
/// observations is the value of the earlier observation (step semantics).
///
/// This library has as its task to turn such a document into data that can be shown together:
///
/// - Decode the document, treating malformed data as an error rather than repairing it.
///
/// - Optionally drop host events that carry no new information.
///
/// - Resolve the requested time window against the data and build a shared time grid from the
///   observed times, with outliers removed.
///
/// - Clip every host to the window and resample it onto the grid.
///
/// - Compute per-host state occupancy statistics and area-under-curve statistics for resource
///   usage, and aligned series for per-state host counts and per-host capacity and usage.
mod areastats;
mod dataset;
mod hostevent;
mod input;
mod minimize;
mod normalize;
mod outliers;
mod report;
mod states;
mod statestats;
mod timegrid;

// Host power and activity states, with their names, grouping and availability.

pub use states::StateCode;

// Seconds since the epoch, fractional.

pub use hostevent::Timestamp;

// One observation of one host, and all the observations in a document by host name.

pub use hostevent::HostEvent;
pub use hostevent::HostEvents;

// Stable sort of a host's events by time.

pub use hostevent::sort_by_time;

// Read a report document from a file, from a reader, or from an already-parsed JSON value.

pub use input::parse_document;
pub use input::read_from_json;
pub use input::read_from_reader;
pub use input::Document;

// Remove outliers from a set of values using the interquartile range.

pub use outliers::filter_outliers;

// The requested time window (either bound optional) and the window resolved against the data.

pub use timegrid::Timebound;
pub use timegrid::TimeWindow;

// Resolve a window against a set of observation times.

pub use timegrid::resolve_window;

// Build the shared time grid from a set of observation times and a window.

pub use timegrid::build_grid;

// Sets of {x,y} series aligned on the union of their x values.

pub use dataset::Dataset;
pub use dataset::Point;

// Resample a time-ordered sequence onto a grid, carrying values forward.

pub use dataset::forward_fill;

// Drop host events that repeat the previous event under a set of criteria.

pub use minimize::minimize_hostevents;
pub use minimize::Criteria;

// Per-host time spent in each state.

pub use statestats::StateStatsRecord;
pub use statestats::StatesStats;
pub use statestats::StatesSummary;

// Area, mean and value histogram of a step function.

pub use areastats::AreaStats;
pub use areastats::AreaStatsRecord;
pub use areastats::Sample;
pub use areastats::INTERVALS;

// Run equivalence and acceptance predicates for AreaStats.

pub use areastats::accept_all;
pub use areastats::accept_available;
pub use areastats::same_value;
pub use areastats::same_value_and_state;

// The normalized data of a document: grid, clipped and filled host events, and capacity.

pub use normalize::Capacity;
pub use normalize::CluesData;
pub use normalize::HostAreaStats;
pub use normalize::ResourceSeries;

// Convert a Timestamp to the millisecond x values used by the series.

pub use normalize::to_millis;

// The grid, the series and all the statistics for a document.

pub use report::Report;
