use crate::commands::{export, filter, hours};

#[derive(Clone, Copy)]
pub struct ExampleGroup {
    pub title: &'static str,
    pub commands: &'static [&'static str],
}

#[derive(Clone, Copy)]
pub struct CommandExample {
    pub name: &'static str,
    pub groups: &'static [ExampleGroup],
}

pub fn command_examples() -> &'static [CommandExample] {
    &[
        CommandExample {
            name: "filter",
            groups: filter::EXAMPLES,
        },
        CommandExample {
            name: "export",
            groups: export::EXAMPLES,
        },
        CommandExample {
            name: "hours",
            groups: hours::EXAMPLES,
        },
    ]
}
