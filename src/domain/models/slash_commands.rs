#[cfg(test)]
#[path = "slash_commands_test.rs"]
mod tests;

pub struct SlashCommand {
    command: String,
    pub args: Vec<String>,
}

impl SlashCommand {
    pub fn parse(text: &str) -> Option<SlashCommand> {
        let mut args = text
            .trim()
            .split(' ')
            .map(|e| return e.to_string())
            .collect::<Vec<String>>();
        let prefix = args[0].to_string();
        args.remove(0);

        let cmd = SlashCommand {
            command: prefix,
            args,
        };
        if cmd.is_quit()
            || cmd.is_new_session()
            || cmd.is_model_list()
            || cmd.is_model_set()
            || cmd.is_writing_type()
            || cmd.is_focus()
            || cmd.is_name()
            || cmd.is_save()
            || cmd.is_load()
            || cmd.is_tokens()
            || cmd.is_help()
        {
            return Some(cmd);
        }

        return None;
    }

    pub fn is_quit(&self) -> bool {
        return ["/q", "/quit", "/exit"].contains(&self.command.as_str());
    }

    pub fn is_new_session(&self) -> bool {
        return ["/n", "/new"].contains(&self.command.as_str());
    }

    pub fn is_model_list(&self) -> bool {
        return ["/ml", "/modellist"].contains(&self.command.as_str());
    }

    pub fn is_model_set(&self) -> bool {
        return ["/m", "/model"].contains(&self.command.as_str());
    }

    pub fn is_writing_type(&self) -> bool {
        return ["/w", "/type"].contains(&self.command.as_str());
    }

    pub fn is_focus(&self) -> bool {
        return ["/f", "/focus"].contains(&self.command.as_str());
    }

    pub fn is_name(&self) -> bool {
        return ["/u", "/name"].contains(&self.command.as_str());
    }

    pub fn is_save(&self) -> bool {
        return ["/s", "/save"].contains(&self.command.as_str());
    }

    pub fn is_load(&self) -> bool {
        return ["/l", "/load"].contains(&self.command.as_str());
    }

    pub fn is_tokens(&self) -> bool {
        return ["/tk", "/tokens"].contains(&self.command.as_str());
    }

    pub fn is_help(&self) -> bool {
        return ["/h", "/help"].contains(&self.command.as_str());
    }
}
