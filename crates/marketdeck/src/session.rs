use crate::render::Card;
use marketdeck_core::{Action, Selection};
use std::str::FromStr;

pub const HELP: &str = "\
commands:
  search <term>            filter by text (applied after a short pause)
  clear                    drop the search term
  sort <key>               change the sort key
  filter <name> <value>    set a filter; `all` clears it
  more | all               show another page | every match
  refresh                  reload from the data source
  bookmark <id>            save an article (news only)
  help | quit";

/// One parsed line of session input.
#[derive(Debug)]
pub enum Input<R: Card> {
    /// Goes through the debouncer.
    Search(String),
    Act(Action<R>),
    Help,
    Blank,
    Invalid(String),
}

pub fn parse<R>(line: &str) -> Input<R>
where
    R: Card,
    R::Sort: FromStr,
{
    let line = line.trim();
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command.to_lowercase().as_str() {
        "" => Input::Blank,
        "search" | "s" => Input::Search(rest.to_string()),
        "clear" => Input::Search(String::new()),
        "sort" => match R::Sort::from_str(rest) {
            Ok(sort) => Input::Act(Action::Sort(sort)),
            Err(_) => Input::Invalid(format!("unknown sort key: {rest:?}")),
        },
        "filter" => {
            let (name, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            match R::dimension(name) {
                Some(dimension) => Input::Act(Action::Filter(dimension, Selection::parse(value))),
                None => Input::Invalid(format!("no filter named {name:?} on {}", R::NOUN)),
            }
        }
        "more" => Input::Act(Action::LoadMore),
        "all" => Input::Act(Action::ShowAll),
        "refresh" | "r" => Input::Act(Action::Refresh { manual: true }),
        "bookmark" | "b" if !rest.is_empty() => Input::Act(Action::Bookmark(rest.to_string())),
        "quit" | "exit" | "q" => Input::Act(Action::Quit),
        "help" | "?" => Input::Help,
        _ => Input::Invalid(format!("unrecognised input: {line:?}")),
    }
}
