use serde::{Deserialize, Serialize};

use crate::domain::{Todo, TodoId};

/// Instructions from the controller to whatever draws the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum RenderCommand {
    SetFilter(String),
    ShowEntries(Vec<Todo>),
    ContentBlockVisibility { visible: bool },
    ToggleAll { checked: bool },
    ClearCompletedButton { completed: usize, visible: bool },
    ElementComplete { id: TodoId, completed: bool },
    ClearNewTodo,
    RemoveItem(TodoId),
    UpdateElementCount(usize),
    EditItem { id: TodoId, title: String },
    EditItemDone { id: TodoId, title: String },
}

impl RenderCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetFilter(_) => "setFilter",
            Self::ShowEntries(_) => "showEntries",
            Self::ContentBlockVisibility { .. } => "contentBlockVisibility",
            Self::ToggleAll { .. } => "toggleAll",
            Self::ClearCompletedButton { .. } => "clearCompletedButton",
            Self::ElementComplete { .. } => "elementComplete",
            Self::ClearNewTodo => "clearNewTodo",
            Self::RemoveItem(_) => "removeItem",
            Self::UpdateElementCount(_) => "updateElementCount",
            Self::EditItem { .. } => "editItem",
            Self::EditItemDone { .. } => "editItemDone",
        }
    }
}

/// Events raised by the view in response to user input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ViewEvent {
    NewTodo { title: String },
    ItemRemove { id: TodoId },
    ItemToggle { id: TodoId, completed: bool },
    ItemEdit { id: TodoId },
    ItemEditDone { id: TodoId, title: String },
    ItemEditCancel { id: TodoId },
    RemoveCompleted,
    ToggleAll { completed: bool },
}

impl ViewEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewTodo { .. } => "newTodo",
            Self::ItemRemove { .. } => "itemRemove",
            Self::ItemToggle { .. } => "itemToggle",
            Self::ItemEdit { .. } => "itemEdit",
            Self::ItemEditDone { .. } => "itemEditDone",
            Self::ItemEditCancel { .. } => "itemEditCancel",
            Self::RemoveCompleted => "removeCompleted",
            Self::ToggleAll { .. } => "toggleAll",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_commands_serialize_with_wire_names() {
        let json = serde_json::to_value(RenderCommand::ElementComplete {
            id: TodoId(3),
            completed: true,
        })
        .expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "type": "elementComplete",
                "payload": { "id": 3, "completed": true }
            })
        );

        let json = serde_json::to_value(RenderCommand::ClearNewTodo).expect("serialize");
        assert_eq!(json, serde_json::json!({ "type": "clearNewTodo" }));
    }

    #[test]
    fn serde_tag_agrees_with_name() {
        let commands = [
            RenderCommand::SetFilter("active".into()),
            RenderCommand::RemoveItem(TodoId(1)),
            RenderCommand::UpdateElementCount(0),
            RenderCommand::ToggleAll { checked: true },
        ];
        for command in commands {
            let json = serde_json::to_value(&command).expect("serialize");
            assert_eq!(json["type"], command.name());
        }
    }

    #[test]
    fn view_events_parse_from_json() {
        let event: ViewEvent = serde_json::from_str(
            r#"{"type":"itemEditDone","payload":{"id":21,"title":"new title"}}"#,
        )
        .expect("parse");
        assert_eq!(
            event,
            ViewEvent::ItemEditDone {
                id: TodoId(21),
                title: "new title".into()
            }
        );
        assert_eq!(event.name(), "itemEditDone");
    }
}
