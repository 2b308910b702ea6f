//! Controller layer: route handling, view event dispatch and render orchestration.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::{
    domain::{Filter, Todo, TodoCounts, TodoId, TodoPatch, TodoQuery},
    error::classify,
    protocol::{RenderCommand, ViewEvent},
};
use tracing::{debug, error, info, warn};

pub mod events;

use events::{Input, ViewEvents};

/// Persistence backing the todo list. Each call resolves exactly once.
#[async_trait]
pub trait Model: Send + Sync {
    async fn read(&self, query: TodoQuery) -> Result<Vec<Todo>>;
    async fn get_count(&self) -> Result<TodoCounts>;
    async fn create(&self, title: &str) -> Result<Todo>;
    async fn update(&self, id: TodoId, changes: TodoPatch) -> Result<()>;
    async fn remove(&self, id: TodoId) -> Result<()>;
}

pub trait View: Send + Sync {
    fn render(&self, command: RenderCommand);
}

pub struct Controller {
    model: Arc<dyn Model>,
    view: Arc<dyn View>,
    active_filter: Filter,
}

impl Controller {
    pub fn new(model: Arc<dyn Model>, view: Arc<dyn View>) -> Self {
        Self {
            model,
            view,
            active_filter: Filter::All,
        }
    }

    pub fn active_filter(&self) -> Filter {
        self.active_filter
    }

    /// Switches the list to the filter named by `route` and redraws it.
    pub async fn set_view(&mut self, route: &str) -> Result<()> {
        let filter = Filter::from_route(route);
        self.active_filter = filter;
        debug!(route, filter = filter.as_str(), "setting view");

        let todos = self.read(filter.query()).await?;
        self.render(RenderCommand::SetFilter(filter.as_str().to_string()));
        self.render(RenderCommand::ShowEntries(todos));
        self.update_count().await
    }

    /// Routes a view event to its handler; the typed form of `trigger`.
    pub async fn dispatch(&mut self, event: ViewEvent) -> Result<()> {
        match event {
            ViewEvent::NewTodo { title } => self.new_todo(&title).await,
            ViewEvent::ItemRemove { id } => self.item_remove(id).await,
            ViewEvent::ItemToggle { id, completed } => self.item_toggle(id, completed).await,
            ViewEvent::ItemEdit { id } => self.item_edit(id).await,
            ViewEvent::ItemEditDone { id, title } => self.item_edit_done(id, &title).await,
            ViewEvent::ItemEditCancel { id } => self.item_edit_cancel(id).await,
            ViewEvent::RemoveCompleted => self.remove_completed().await,
            ViewEvent::ToggleAll { completed } => self.toggle_all(completed).await,
        }
    }

    /// Handles queued input until every sender is dropped. A failed event is
    /// logged and skipped.
    pub async fn run(&mut self, mut events: ViewEvents) {
        while let Some(input) = events.next().await {
            let name = input.name();
            let outcome = match input {
                Input::Navigate(route) => self.set_view(&route).await,
                Input::Event(event) => self.dispatch(event).await,
            };
            if let Err(err) = outcome {
                error!(
                    event = name,
                    code = ?classify(&*err),
                    error = %format!("{err:#}"),
                    "view event failed"
                );
            }
        }
        debug!("view event channel closed");
    }

    pub async fn new_todo(&mut self, title: &str) -> Result<()> {
        let title = title.trim();
        if title.is_empty() {
            debug!("ignoring blank todo title");
            return Ok(());
        }

        let todo = self
            .model
            .create(title)
            .await
            .context("failed to create todo")?;
        info!(todo_id = todo.id.0, "created todo");

        self.refresh().await?;
        self.render(RenderCommand::ClearNewTodo);
        Ok(())
    }

    pub async fn item_remove(&mut self, id: TodoId) -> Result<()> {
        self.remove_one(id).await?;
        self.refresh().await
    }

    pub async fn remove_completed(&mut self) -> Result<()> {
        let completed = self.read(TodoQuery::completed(true)).await?;
        for todo in completed {
            self.remove_one(todo.id).await?;
        }
        self.refresh().await
    }

    pub async fn item_toggle(&mut self, id: TodoId, completed: bool) -> Result<()> {
        self.set_completed(id, completed).await?;
        self.refresh().await
    }

    /// Marks every todo as `completed`. Only todos in the opposite state are
    /// touched.
    pub async fn toggle_all(&mut self, completed: bool) -> Result<()> {
        let pending = self.read(TodoQuery::completed(!completed)).await?;
        for todo in pending {
            self.set_completed(todo.id, completed).await?;
        }
        self.refresh().await
    }

    pub async fn item_edit(&mut self, id: TodoId) -> Result<()> {
        if let Some(todo) = self.find(id).await? {
            self.render(RenderCommand::EditItem {
                id,
                title: todo.title,
            });
        }
        Ok(())
    }

    /// Saves an edited title. An empty title deletes the todo instead.
    pub async fn item_edit_done(&mut self, id: TodoId, title: &str) -> Result<()> {
        let title = title.trim();
        if title.is_empty() {
            return self.item_remove(id).await;
        }

        self.model
            .update(id, TodoPatch::title(title))
            .await
            .with_context(|| format!("failed to update title of todo {id}"))?;
        info!(todo_id = id.0, "renamed todo");
        self.render(RenderCommand::EditItemDone {
            id,
            title: title.to_string(),
        });
        Ok(())
    }

    pub async fn item_edit_cancel(&mut self, id: TodoId) -> Result<()> {
        if let Some(todo) = self.find(id).await? {
            self.render(RenderCommand::EditItemDone {
                id,
                title: todo.title,
            });
        }
        Ok(())
    }

    async fn read(&self, query: TodoQuery) -> Result<Vec<Todo>> {
        self.model
            .read(query)
            .await
            .with_context(|| format!("failed to read todos matching {query:?}"))
    }

    async fn find(&self, id: TodoId) -> Result<Option<Todo>> {
        let todo = self.read(TodoQuery::by_id(id)).await?.into_iter().next();
        if todo.is_none() {
            warn!(todo_id = id.0, "no todo with this id");
        }
        Ok(todo)
    }

    async fn remove_one(&self, id: TodoId) -> Result<()> {
        self.model
            .remove(id)
            .await
            .with_context(|| format!("failed to remove todo {id}"))?;
        info!(todo_id = id.0, "removed todo");
        self.render(RenderCommand::RemoveItem(id));
        Ok(())
    }

    async fn set_completed(&self, id: TodoId, completed: bool) -> Result<()> {
        self.model
            .update(id, TodoPatch::completed(completed))
            .await
            .with_context(|| format!("failed to update completion of todo {id}"))?;
        info!(todo_id = id.0, completed, "toggled todo");
        self.render(RenderCommand::ElementComplete { id, completed });
        Ok(())
    }

    /// Redraws the entries for the active filter and the count block.
    async fn refresh(&self) -> Result<()> {
        let todos = self.read(self.active_filter.query()).await?;
        self.render(RenderCommand::ShowEntries(todos));
        self.update_count().await
    }

    async fn update_count(&self) -> Result<()> {
        let counts = self
            .model
            .get_count()
            .await
            .context("failed to count todos")?;

        self.render(RenderCommand::UpdateElementCount(counts.active));
        self.render(RenderCommand::ClearCompletedButton {
            completed: counts.completed,
            visible: counts.completed > 0,
        });
        self.render(RenderCommand::ToggleAll {
            checked: counts.all_completed(),
        });
        self.render(RenderCommand::ContentBlockVisibility {
            visible: counts.total > 0,
        });
        Ok(())
    }

    fn render(&self, command: RenderCommand) {
        debug!(command = command.name(), "render");
        self.view.render(command);
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
