use crate::roster::StaffRoster;

/// Round-robin over the staff roster, driven by a pointer that outlives the run.
///
/// The pointer comes in from the store and goes back out through
/// [`RoundRobin::into_pointer`]; the caller persists it once, after a
/// successful run.
#[derive(Debug)]
pub struct RoundRobin {
    roster: StaffRoster,
    pointer: u64,
}

impl RoundRobin {
    pub fn new(roster: StaffRoster, pointer: u64) -> Self {
        let pointer = pointer % roster.len() as u64;
        Self { roster, pointer }
    }

    pub fn next(&mut self) -> String {
        let len = self.roster.len() as u64;
        let staff = self.roster.get(self.pointer as usize).to_string();
        self.pointer = (self.pointer + 1) % len;
        staff
    }

    /// Final pointer, already reduced modulo the roster length.
    pub fn into_pointer(self) -> u64 {
        self.pointer
    }
}
