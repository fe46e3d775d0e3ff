/// Host state codes as reported by the CLUES monitor.
///
/// Negative codes denote error, unknown, or disappeared conditions; the non-negative codes are the
/// operational states.  The two "(err)" states are degenerate: they are displayed and aggregated as
/// one of the base states (see `aggregate`).
///
/// The set of states is closed, so the display tables that go with it are methods on the enum
/// rather than runtime dictionaries.

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StateCode {
    Error = -2,
    Unknown = -1,
    Idle = 0,
    Used = 1,
    Off = 2,
    PoweringOn = 3,
    PoweringOff = 4,
    OnError = 5,
    OffError = 6,
}

impl StateCode {
    /// Every known state, ascending by code.
    pub const ALL: [StateCode; 9] = [
        StateCode::Error,
        StateCode::Unknown,
        StateCode::Idle,
        StateCode::Used,
        StateCode::Off,
        StateCode::PoweringOn,
        StateCode::PoweringOff,
        StateCode::OnError,
        StateCode::OffError,
    ];

    /// The states that are drawn in the state-change chart, in stacking order.
    pub const DRAW: [StateCode; 6] = [
        StateCode::Used,
        StateCode::Idle,
        StateCode::PoweringOff,
        StateCode::PoweringOn,
        StateCode::Unknown,
        StateCode::Error,
    ];

    /// The states summarized in the per-host overview.
    pub const STATS: [StateCode; 4] = [
        StateCode::Error,
        StateCode::Unknown,
        StateCode::Idle,
        StateCode::Off,
    ];

    pub fn from_code(code: i64) -> Option<StateCode> {
        StateCode::ALL.into_iter().find(|s| s.code() == code)
    }

    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn name(self) -> &'static str {
        match self {
            StateCode::Error => "error",
            StateCode::Unknown => "unknown",
            StateCode::Idle => "idle",
            StateCode::Used => "used",
            StateCode::Off => "off",
            StateCode::PoweringOn => "powering on",
            StateCode::PoweringOff => "powering off",
            StateCode::OnError => "on (err)",
            StateCode::OffError => "off (err)",
        }
    }

    /// The base state this state is counted as when hosts are aggregated per state.

    pub fn aggregate(self) -> StateCode {
        match self {
            StateCode::OnError => StateCode::Idle,
            StateCode::OffError => StateCode::Error,
            s => s,
        }
    }

    /// True if a host in this state contributes its slots and memory to the cluster capacity.

    pub fn is_available(self) -> bool {
        matches!(self, StateCode::Idle | StateCode::Used | StateCode::OnError)
    }
}

#[test]
fn test_state_codes() {
    for s in StateCode::ALL {
        assert_eq!(StateCode::from_code(s.code()), Some(s));
    }
    assert_eq!(StateCode::from_code(7), None);
    assert_eq!(StateCode::from_code(-3), None);
    assert!(StateCode::Error < StateCode::Unknown);
    assert!(StateCode::Unknown < StateCode::Idle);
}

#[test]
fn test_state_tables() {
    assert_eq!(StateCode::OnError.aggregate(), StateCode::Idle);
    assert_eq!(StateCode::OffError.aggregate(), StateCode::Error);
    assert_eq!(StateCode::PoweringOn.aggregate(), StateCode::PoweringOn);
    assert!(StateCode::OnError.is_available());
    assert!(!StateCode::Off.is_available());
    assert!(!StateCode::PoweringOn.is_available());
    assert_eq!(StateCode::PoweringOff.name(), "powering off");
    for s in StateCode::DRAW {
        assert_eq!(s.aggregate(), s);
    }
}
