use super::*;

/// Subroutine nesting ceiling. Reaching it is fatal: it signals a circular
/// common-event call graph, not a recoverable runtime condition.
pub const MAX_CALL_DEPTH: u32 = 100;

/// Commands dispatched within one host frame before the watchdog forces a
/// yield so a non-blocking script cannot starve the frame loop.
pub const FREEZE_THRESHOLD: u32 = 100_000;

/// Frame count used by the fixed-speed screen fade commands.
pub(super) const FADE_FRAMES: i64 = 24;

pub(super) type BranchTable = BTreeMap<usize, BranchValue>;

/// One execution context over a command list. At most one child context is
/// active at a time; the parent defers to it until it finishes.
pub struct Interpreter {
    pub(super) depth: u32,
    pub(super) map_id: i64,
    pub(super) event_id: i64,
    pub(super) list: Option<CommandList>,
    pub(super) index: usize,
    pub(super) indent: usize,
    // Shared with deferred choice/battle-result callbacks, which write the
    // selected index back after the prompt resolves.
    pub(super) branch: Rc<RefCell<BranchTable>>,
    pub(super) wait_count: i64,
    pub(super) wait_mode: WaitMode,
    pub(super) comments: Vec<String>,
    pub(super) child: Option<Box<Interpreter>>,
    pub(super) frame_count: u64,
    pub(super) freeze_checker: u32,
    pub(super) rng_state: u32,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::build(0)
    }

    pub(super) fn with_depth(depth: u32) -> Result<Self, InterpreterError> {
        if depth >= MAX_CALL_DEPTH {
            return Err(InterpreterError::new(
                "INTERP_CALL_OVERFLOW",
                "Common event calls exceeded the limit.",
            ));
        }
        Ok(Self::build(depth))
    }

    fn build(depth: u32) -> Self {
        Self {
            depth,
            map_id: 0,
            event_id: 0,
            list: None,
            index: 0,
            indent: 0,
            branch: Rc::new(RefCell::new(BranchTable::new())),
            wait_count: 0,
            wait_mode: WaitMode::None,
            comments: Vec::new(),
            child: None,
            frame_count: 0,
            freeze_checker: 0,
            rng_state: 1,
        }
    }

    /// Drops the bound stream and every piece of transient state. A cleared
    /// context is not running until the next `setup`.
    pub fn clear(&mut self) {
        self.map_id = 0;
        self.event_id = 0;
        self.list = None;
        self.index = 0;
        self.branch.borrow_mut().clear();
        self.wait_count = 0;
        self.wait_mode = WaitMode::None;
        self.comments.clear();
        self.child = None;
    }

    /// Binds a command list and arms the context. `event_id` 0 means the
    /// stream has no owning map event (a common event).
    pub fn setup(&mut self, list: CommandList, event_id: i64, map_id: i64) {
        self.clear();
        self.map_id = map_id;
        self.event_id = event_id;
        self.list = Some(list);
    }

    pub fn is_running(&self) -> bool {
        self.list.is_some()
    }

    pub fn event_id(&self) -> i64 {
        self.event_id
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn wait_mode(&self) -> WaitMode {
        self.wait_mode
    }

    /// Comment lines absorbed from the most recent comment command; kept
    /// for plugin commands that read annotations placed above them.
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn set_random_seed(&mut self, seed: u32) {
        self.rng_state = seed;
    }

    /// Arms a named suspension condition; dispatch stays paused until the
    /// matching collaborator predicate clears.
    pub fn set_wait_mode(&mut self, mode: WaitMode) {
        self.wait_mode = mode;
    }

    /// Suspends dispatch for a fixed number of host frames.
    pub fn wait(&mut self, duration: i64) {
        self.wait_count = duration;
    }

    pub(super) fn terminate(&mut self) {
        self.list = None;
        self.comments.clear();
    }

    pub(super) fn is_on_current_map(&self, host: &mut dyn Host) -> bool {
        self.map_id == host.map_id()
    }

    pub(super) fn current_command(&self) -> Option<&EventCommand> {
        self.list.as_ref()?.get(self.index)
    }

    /// Opcode of the following command, or 0 past the end. Used by handlers
    /// that greedily absorb contiguous continuation lines.
    pub(super) fn next_event_code(&self) -> i32 {
        self.list
            .as_ref()
            .and_then(|list| list.get(self.index + 1))
            .map(|command| command.code)
            .unwrap_or(0)
    }

    /// Advances the cursor past the nested block belonging to the current
    /// control command: every following command with a deeper indent.
    pub(super) fn skip_branch(&mut self) {
        let Some(list) = self.list.as_ref() else {
            return;
        };
        while list
            .get(self.index + 1)
            .is_some_and(|command| command.indent > self.indent)
        {
            self.index += 1;
        }
    }

    /// Repositions the cursor, invalidating the branch decision of every
    /// indent level crossed on the way so a stale decision cannot leak into
    /// the block the jump lands in.
    pub(super) fn jump_to(&mut self, destination: usize) {
        let Some(list) = self.list.clone() else {
            return;
        };
        let start = destination.min(self.index);
        let end = destination.max(self.index);
        let mut indent = self.indent;
        let mut branch = self.branch.borrow_mut();
        for command in list.iter().take(end + 1).skip(start) {
            if command.indent != indent {
                branch.remove(&indent);
                indent = command.indent;
            }
        }
        drop(branch);
        self.index = destination;
    }

    pub(super) fn branch_value(&self, indent: usize) -> Option<BranchValue> {
        self.branch.borrow().get(&indent).copied()
    }

    pub(super) fn set_branch(&mut self, indent: usize, value: BranchValue) {
        self.branch.borrow_mut().insert(indent, value);
    }

    /// A deferred writer for asynchronous multi-way decisions. The prompt's
    /// collaborator calls it once with the selected index, which lands at
    /// the indent of the presenting command.
    pub(super) fn branch_writer(&self, indent: usize) -> IndexCallback {
        let branch = Rc::clone(&self.branch);
        Box::new(move |selected| {
            branch.borrow_mut().insert(indent, BranchValue::Index(selected));
        })
    }

    /// Resolves a raw character selector against the owning event: negative
    /// is the player, 0 the owning event, positive a map event id. Yields
    /// none in battle or when the context's map is no longer loaded.
    pub(super) fn resolve_character(
        &self,
        host: &mut dyn Host,
        selector: i64,
    ) -> Option<CharacterRef> {
        if host.party().in_battle() {
            None
        } else if selector < 0 {
            Some(CharacterRef::Player)
        } else if self.is_on_current_map(host) {
            let event_id = if selector > 0 { selector } else { self.event_id };
            (event_id > 0).then_some(CharacterRef::Event(event_id))
        } else {
            None
        }
    }

    /// Decodes the shared (operation, operand-type, operand) triple used by
    /// gold/item/stat deltas: a constant or variable-indexed magnitude,
    /// negated for "decrease".
    pub(super) fn operate_value(
        &self,
        host: &mut dyn Host,
        operation: i64,
        operand_type: i64,
        operand: i64,
    ) -> i64 {
        let value = if operand_type == 0 {
            operand
        } else {
            host.variables().value(operand)
        };
        if operation == 0 {
            value
        } else {
            -value
        }
    }
}
