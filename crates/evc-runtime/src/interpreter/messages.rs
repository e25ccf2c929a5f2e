use super::*;

impl Interpreter {
    fn current_line(&self) -> String {
        self.current_command()
            .map(|command| param_str(&command.parameters, 0).to_string())
            .unwrap_or_default()
    }

    fn current_params(&self) -> Vec<ParamValue> {
        self.current_command()
            .map(|command| command.parameters.clone())
            .unwrap_or_default()
    }

    /// Queues a message: the header, every contiguous text line below it,
    /// and at most one trailing prompt (choices, number input or item
    /// choice) that shares the message window.
    pub(super) fn show_text(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        if host.message().is_busy() {
            return false;
        }
        let header = TextHeader::from_params(params);
        host.message().begin_message(&header);
        while self.next_event_code() == codes::TEXT_LINE {
            self.index += 1;
            let line = self.current_line();
            host.message().add(&line);
        }
        match self.next_event_code() {
            codes::SHOW_CHOICES => {
                self.index += 1;
                let prompt = self.current_params();
                self.setup_choices(host, &prompt);
            }
            codes::INPUT_NUMBER => {
                self.index += 1;
                let prompt = self.current_params();
                self.setup_number_input(host, &prompt);
            }
            codes::SELECT_ITEM => {
                self.index += 1;
                let prompt = self.current_params();
                self.setup_item_choice(host, &prompt);
            }
            _ => {}
        }
        self.set_wait_mode(WaitMode::Message);
        true
    }

    pub(super) fn show_choices(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        if host.message().is_busy() {
            return false;
        }
        self.setup_choices(host, params);
        self.set_wait_mode(WaitMode::Message);
        true
    }

    fn setup_choices(&mut self, host: &mut dyn Host, params: &[ParamValue]) {
        let setup = ChoiceSetup::from_params(params);
        let callback = self.branch_writer(self.indent);
        host.message().show_choices(setup, callback);
    }

    pub(super) fn input_number(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        if host.message().is_busy() {
            return false;
        }
        self.setup_number_input(host, params);
        self.set_wait_mode(WaitMode::Message);
        true
    }

    fn setup_number_input(&mut self, host: &mut dyn Host, params: &[ParamValue]) {
        host.message()
            .set_number_input(param_int(params, 0), param_int(params, 1));
    }

    pub(super) fn select_item(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        if host.message().is_busy() {
            return false;
        }
        self.setup_item_choice(host, params);
        self.set_wait_mode(WaitMode::Message);
        true
    }

    fn setup_item_choice(&mut self, host: &mut dyn Host, params: &[ParamValue]) {
        // An absent item type slot means "regular items".
        let item_type = match param_int(params, 1) {
            0 => 2,
            other => other,
        };
        host.message()
            .set_item_choice(param_int(params, 0), item_type);
    }

    pub(super) fn show_scrolling_text(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        if host.message().is_busy() {
            return false;
        }
        host.message()
            .set_scroll(param_int(params, 0), param_flag(params, 1));
        while self.next_event_code() == codes::SCROLLING_TEXT_LINE {
            self.index += 1;
            let line = self.current_line();
            host.message().add(&line);
        }
        self.set_wait_mode(WaitMode::Message);
        true
    }

    /// Replaces the retained annotation block with this comment and its
    /// continuation lines.
    pub(super) fn absorb_comment(&mut self, params: &[ParamValue]) -> bool {
        self.comments = vec![param_str(params, 0).to_string()];
        while self.next_event_code() == codes::COMMENT_LINE {
            self.index += 1;
            let line = self.current_line();
            self.comments.push(line);
        }
        true
    }
}
