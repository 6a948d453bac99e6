//! Task endpoints.
//!
//! Each handler takes the store explicitly and runs to completion while the
//! caller holds it: existence checks, validation and the write happen as one
//! step from the point of view of other requests.

use axum::http::{Method, StatusCode};
use chrono::Utc;
use serde_json::Value;

use crate::routing::{PatternError, Response, RouteRequest, Router};
use crate::store::{Criteria, Store, StoreError};
use crate::tasks::error::ApiError;
use crate::tasks::model::Task;

pub const TITLE_REQUIRED: &str = "task title must be provided";
pub const DESCRIPTION_REQUIRED: &str = "task description must be provided";
pub const TASK_NOT_FOUND: &str = "task does not exist";
pub const ALREADY_COMPLETED: &str = "task is already completed";

/// Route table for the task API.
pub type TaskRouter = Router<Store, ApiError>;

/// Build the task routes in their fixed order.
pub fn routes() -> Result<TaskRouter, PatternError> {
    let mut router = TaskRouter::new();
    router
        .register(Method::GET, "/tasks", list_tasks)?
        .register(Method::POST, "/tasks", create_task)?
        .register(Method::PUT, "/tasks/:id", update_task)?
        .register(Method::DELETE, "/tasks/:id", delete_task)?
        .register(Method::PATCH, "/tasks/:id/complete", complete_task)?;
    Ok(router)
}

/// `GET /tasks?search=S`: tasks whose title or description contains `S`.
pub fn list_tasks(store: &mut Store, req: RouteRequest) -> Result<Response, ApiError> {
    let search = req.query("search");
    let criteria = Criteria::new()
        .field("title", search)
        .field("description", search);

    let tasks = store.select::<Task>(&criteria)?;
    let body = serde_json::to_value(&tasks).map_err(StoreError::from)?;
    Ok(Response::json(StatusCode::OK, body))
}

/// `POST /tasks`
pub fn create_task(store: &mut Store, req: RouteRequest) -> Result<Response, ApiError> {
    let (title, description) = text_fields(&req.body)?;

    let task = Task::new(title, description);
    store.insert(&task)?;
    tracing::info!(id = %task.id, "Task created");

    Ok(Response::empty(StatusCode::CREATED))
}

/// `PUT /tasks/:id`
pub fn update_task(store: &mut Store, req: RouteRequest) -> Result<Response, ApiError> {
    let task = existing_task(store, &req)?;
    let (title, description) = text_fields(&req.body)?;

    store.update(&task.id, &task.edited(title, description, Utc::now()))?;
    tracing::info!(id = %task.id, "Task updated");

    Ok(Response::empty(StatusCode::NO_CONTENT))
}

/// `DELETE /tasks/:id`
pub fn delete_task(store: &mut Store, req: RouteRequest) -> Result<Response, ApiError> {
    let task = existing_task(store, &req)?;

    store.delete::<Task>(&task.id)?;
    tracing::info!(id = %task.id, "Task deleted");

    Ok(Response::empty(StatusCode::NO_CONTENT))
}

/// `PATCH /tasks/:id/complete`
pub fn complete_task(store: &mut Store, req: RouteRequest) -> Result<Response, ApiError> {
    let task = existing_task(store, &req)?;
    if task.is_completed() {
        return Err(ApiError::Validation(ALREADY_COMPLETED));
    }

    store.update(&task.id, &task.completed(Utc::now()))?;
    tracing::info!(id = %task.id, "Task completed");

    Ok(Response::empty(StatusCode::NO_CONTENT))
}

fn existing_task(store: &Store, req: &RouteRequest) -> Result<Task, ApiError> {
    let id = req.param("id").unwrap_or_default();
    store
        .find::<Task>(id)?
        .ok_or(ApiError::Validation(TASK_NOT_FOUND))
}

/// Title and description from the body, both required and non-empty.
fn text_fields(body: &Value) -> Result<(String, String), ApiError> {
    let title = non_empty(body, "title").ok_or(ApiError::Validation(TITLE_REQUIRED))?;
    let description =
        non_empty(body, "description").ok_or(ApiError::Validation(DESCRIPTION_REQUIRED))?;
    Ok((title, description))
}

fn non_empty(body: &Value, field: &str) -> Option<String> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryPersistence;
    use serde_json::json;
    use std::collections::HashMap;

    struct Harness {
        router: TaskRouter,
        store: Store,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                router: routes().unwrap(),
                store: Store::in_memory(),
            }
        }

        fn call(&mut self, method: Method, uri: &str, body: Value) -> Result<Response, ApiError> {
            let (path, query) = match uri.split_once('?') {
                Some((path, query)) => (path, query),
                None => (uri, ""),
            };
            let query: HashMap<String, String> = url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect();
            self.router
                .dispatch(&mut self.store, &method, path, query, body)
        }

        fn status(&mut self, method: Method, uri: &str, body: Value) -> StatusCode {
            match self.call(method, uri, body) {
                Ok(res) => res.status,
                Err(e) => e.status(),
            }
        }

        fn message(&mut self, method: Method, uri: &str, body: Value) -> String {
            self.call(method, uri, body).unwrap_err().to_string()
        }

        fn tasks(&mut self, uri: &str) -> Vec<Task> {
            let res = self.call(Method::GET, uri, Value::Null).unwrap();
            assert_eq!(res.status, StatusCode::OK);
            serde_json::from_value(res.body.unwrap()).unwrap()
        }

        fn create(&mut self, title: &str, description: &str) -> Task {
            let status = self.status(
                Method::POST,
                "/tasks",
                json!({ "title": title, "description": description }),
            );
            assert_eq!(status, StatusCode::CREATED);
            self.tasks("/tasks").pop().unwrap()
        }
    }

    #[test]
    fn test_create_then_list() {
        let mut h = Harness::new();
        let task = h.create("Buy milk", "2 liters");

        let tasks = h.tasks("/tasks");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0], task);
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description, "2 liters");
        assert!(task.completed_at.is_none());
        assert!(task.updated_at.is_none());
    }

    #[test]
    fn test_create_validation() {
        let mut h = Harness::new();

        assert_eq!(
            h.message(Method::POST, "/tasks", json!({ "description": "d" })),
            TITLE_REQUIRED
        );
        assert_eq!(
            h.message(Method::POST, "/tasks", json!({ "title": "", "description": "d" })),
            TITLE_REQUIRED
        );
        assert_eq!(
            h.message(Method::POST, "/tasks", json!({ "title": "t" })),
            DESCRIPTION_REQUIRED
        );
        assert_eq!(h.message(Method::POST, "/tasks", Value::Null), TITLE_REQUIRED);
        assert_eq!(h.store.len("tasks"), 0);
    }

    #[test]
    fn test_search_matches_title_or_description() {
        let mut h = Harness::new();
        h.create("Buy milk", "2 liters");
        h.create("Walk dog", "around the milk bar");
        h.create("Read", "a book");

        let titles: Vec<_> = h
            .tasks("/tasks?search=milk")
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, ["Buy milk", "Walk dog"]);

        assert!(h.tasks("/tasks?search=Milk").is_empty());
        assert_eq!(h.tasks("/tasks").len(), 3);
        assert_eq!(h.tasks("/tasks?search=a%20book").len(), 1);
    }

    #[test]
    fn test_update_preserves_timestamps() {
        let mut h = Harness::new();
        let task = h.create("a", "b");
        let uri = format!("/tasks/{}", task.id);

        let status = h.status(Method::PUT, &uri, json!({ "title": "c", "description": "d" }));
        assert_eq!(status, StatusCode::NO_CONTENT);

        let updated = h.tasks("/tasks").pop().unwrap();
        assert_eq!(updated.id, task.id);
        assert_eq!(updated.title, "c");
        assert_eq!(updated.description, "d");
        assert_eq!(updated.created_at, task.created_at);
        assert!(updated.completed_at.is_none());
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn test_update_checks_existence_before_fields() {
        let mut h = Harness::new();
        let task = h.create("a", "b");

        assert_eq!(h.message(Method::PUT, "/tasks/unknown", Value::Null), TASK_NOT_FOUND);

        let uri = format!("/tasks/{}", task.id);
        assert_eq!(
            h.message(Method::PUT, &uri, json!({ "description": "d" })),
            TITLE_REQUIRED
        );
        assert_eq!(
            h.message(Method::PUT, &uri, json!({ "title": "t" })),
            DESCRIPTION_REQUIRED
        );
        assert_eq!(h.tasks("/tasks"), vec![task]);
    }

    #[test]
    fn test_id_prefix_is_not_a_match() {
        let mut h = Harness::new();
        let task = h.create("a", "b");
        let prefix = format!("/tasks/{}", &task.id[..8]);

        assert_eq!(h.message(Method::DELETE, &prefix, Value::Null), TASK_NOT_FOUND);
        assert_eq!(h.tasks("/tasks").len(), 1);
    }

    #[test]
    fn test_delete() {
        let mut h = Harness::new();
        let keep = h.create("keep", "x");
        let gone = h.create("gone", "y");

        let uri = format!("/tasks/{}", gone.id);
        assert_eq!(h.status(Method::DELETE, &uri, Value::Null), StatusCode::NO_CONTENT);
        assert_eq!(h.tasks("/tasks"), vec![keep]);
        assert_eq!(h.message(Method::DELETE, &uri, Value::Null), TASK_NOT_FOUND);
    }

    #[test]
    fn test_complete_only_once() {
        let mut h = Harness::new();
        let task = h.create("a", "b");
        let uri = format!("/tasks/{}/complete", task.id);

        assert_eq!(h.status(Method::PATCH, &uri, Value::Null), StatusCode::NO_CONTENT);
        let first = h.tasks("/tasks").pop().unwrap();
        assert!(first.completed_at.is_some());
        assert_eq!(first.updated_at, first.completed_at);

        assert_eq!(h.message(Method::PATCH, &uri, Value::Null), ALREADY_COMPLETED);
        let second = h.tasks("/tasks").pop().unwrap();
        assert_eq!(second.completed_at, first.completed_at);
    }

    #[test]
    fn test_complete_unknown() {
        let mut h = Harness::new();
        assert_eq!(
            h.status(Method::PATCH, "/tasks/nope/complete", Value::Null),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_unregistered_route_is_404() {
        let mut h = Harness::new();
        assert_eq!(h.status(Method::GET, "/tasks/1", Value::Null), StatusCode::NOT_FOUND);
        assert_eq!(h.status(Method::POST, "/tasks/", Value::Null), StatusCode::NOT_FOUND);
        assert_eq!(h.status(Method::PUT, "/tasks", Value::Null), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_storage_failure_is_fatal() {
        let persistence = MemoryPersistence::new();
        let mut h = Harness {
            router: routes().unwrap(),
            store: Store::open(persistence.clone()).unwrap(),
        };

        persistence.fail_writes(true);
        let err = h
            .call(Method::POST, "/tasks", json!({ "title": "a", "description": "b" }))
            .unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(h.store.len("tasks"), 0);
    }
}
