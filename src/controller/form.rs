use std::sync::{Arc, Mutex};

use log::{debug, info, warn};

use crate::client::RemoteClient;
use crate::controller::{lock, Liveness};
use crate::error::{Error, Result, ValidationError};
use crate::resource::{FormInput, Resource};
use crate::toast::NotificationSink;

#[derive(Debug, Clone, PartialEq)]
pub enum FormMode<R> {
    Closed,
    Create,
    Edit(R),
}

/// What a successful submission did.
#[derive(Debug, Clone, PartialEq)]
pub enum Submitted<R> {
    Created(R),
    Updated(String),
}

struct FormState<R> {
    mode: FormMode<R>,
    values: FormInput,
    errors: Option<ValidationError>,
    in_flight: bool,
    // bumped on every open and close so a slow submit can tell whether the
    // form it came from is still the one on screen
    epoch: u64,
}

impl<R> FormState<R> {
    fn open(&mut self, mode: FormMode<R>, values: FormInput) {
        self.mode = mode;
        self.values = values;
        self.errors = None;
        self.epoch += 1;
    }

    fn close(&mut self) {
        self.open(FormMode::Closed, FormInput::new());
    }
}

/// Clears the in-flight flag when the submission ends, including when the
/// submitting future is dropped part way.
struct InFlight<'a, R>(&'a Mutex<FormState<R>>);

impl<R> Drop for InFlight<'_, R> {
    fn drop(&mut self) {
        lock(self.0).in_flight = false;
    }
}

/// Create/edit form for one resource kind. Only one submission runs at a
/// time; a second one fails fast with [`Error::Busy`].
pub struct FormController<R, C> {
    client: Arc<C>,
    sink: Arc<dyn NotificationSink>,
    liveness: Liveness,
    state: Mutex<FormState<R>>,
}

impl<R: Resource, C: RemoteClient<R>> FormController<R, C> {
    pub fn new(client: Arc<C>, sink: Arc<dyn NotificationSink>, liveness: Liveness) -> Self {
        Self {
            client,
            sink,
            liveness,
            state: Mutex::new(FormState {
                mode: FormMode::Closed,
                values: FormInput::new(),
                errors: None,
                in_flight: false,
                epoch: 0,
            }),
        }
    }

    pub fn open_create(&self) {
        lock(&self.state).open(FormMode::Create, R::descriptor().defaults());
    }

    pub fn open_edit(&self, resource: &R) {
        let values = resource.to_input();
        lock(&self.state).open(FormMode::Edit(resource.clone()), values);
    }

    /// Discards whatever was entered and closes the form.
    pub fn cancel(&self) {
        lock(&self.state).close();
    }

    /// Updates one entered value. Ignored while the form is closed.
    pub fn set_field(&self, name: &str, value: impl Into<String>) {
        let mut state = lock(&self.state);
        if !matches!(state.mode, FormMode::Closed) {
            state.values.insert(name.to_string(), value.into());
        }
    }

    pub fn values(&self) -> FormInput {
        lock(&self.state).values.clone()
    }

    pub fn mode(&self) -> FormMode<R> {
        lock(&self.state).mode.clone()
    }

    pub fn is_open(&self) -> bool {
        !matches!(lock(&self.state).mode, FormMode::Closed)
    }

    pub fn is_submitting(&self) -> bool {
        lock(&self.state).in_flight
    }

    /// Field problems from the last rejected submission.
    pub fn errors(&self) -> Option<ValidationError> {
        lock(&self.state).errors.clone()
    }

    /// Validates `values` and, if they are well formed, inserts or updates
    /// depending on the mode. On success the form closes. On any failure it
    /// stays open with `values` kept.
    pub async fn submit(&self, values: FormInput) -> Result<Submitted<R>> {
        let descriptor = R::descriptor();

        let (target, fields, epoch, guard) = {
            let mut state = lock(&self.state);
            let target = match &state.mode {
                FormMode::Closed => return Err(Error::FormClosed),
                FormMode::Create => None,
                FormMode::Edit(existing) => Some(existing.id().to_string()),
            };
            if state.in_flight {
                debug!("{} submit ignored, one is already in flight", descriptor.singular);
                return Err(Error::Busy);
            }

            state.values = values;
            let fields = match R::parse_fields(&state.values) {
                Ok(fields) => fields,
                Err(e) => {
                    debug!("{} form rejected: {}", descriptor.singular, e);
                    state.errors = Some(e.clone());
                    return Err(e.into());
                }
            };
            state.errors = None;
            state.in_flight = true;
            (target, fields, state.epoch, InFlight(&self.state))
        };

        let result = match &target {
            None => self.client.insert(&fields).await.map(Submitted::Created),
            Some(id) => self
                .client
                .update(id, &fields)
                .await
                .map(|()| Submitted::Updated(id.clone())),
        };
        drop(guard);

        if !self.liveness.is_alive() {
            debug!("dropping {} submit result for disposed page", descriptor.singular);
            return Err(Error::Disposed);
        }

        match result {
            Ok(outcome) => {
                {
                    let mut state = lock(&self.state);
                    if state.epoch == epoch {
                        state.close();
                    }
                }
                let message = match &outcome {
                    Submitted::Created(row) => {
                        info!("created {} {}", descriptor.singular, row.id());
                        descriptor.created_message()
                    }
                    Submitted::Updated(id) => {
                        info!("updated {} {}", descriptor.singular, id);
                        descriptor.updated_message()
                    }
                };
                self.sink.success(&message);
                Ok(outcome)
            }
            Err(Error::NotAuthenticated) => {
                warn!("cannot save {}: not signed in", descriptor.singular);
                Err(Error::NotAuthenticated)
            }
            Err(e) => {
                warn!("saving {} failed: {}", descriptor.singular, e);
                self.sink.failure(&descriptor.save_failed_message());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::auth::Session;
    use crate::client::{Op, ScriptedClient, SqliteClient};
    use crate::db::schema::migrations;
    use crate::db::Db;
    use crate::error::{Problem, RemoteError};
    use crate::resource::{form_input, Equipment, ProductionRecord};
    use crate::toast::{ToastKind, Toaster};

    type Client<R> = ScriptedClient<R, SqliteClient<R>>;

    struct Fixture<R: Resource> {
        session: Arc<Session>,
        client: Arc<Client<R>>,
        toaster: Arc<Toaster>,
        form: FormController<R, Client<R>>,
    }

    fn fixture<R: Resource>() -> Fixture<R> {
        let db = Db::open_memory().unwrap();
        db.migrate(&migrations()).unwrap();
        let session = Arc::new(Session::signed_in("u-1"));
        let client = Arc::new(ScriptedClient::new(SqliteClient::new(db, session.clone())));
        let toaster = Arc::new(Toaster::new(Duration::from_secs(60)));
        let form = FormController::new(client.clone(), toaster.clone(), Liveness::new());
        Fixture {
            session,
            client,
            toaster,
            form,
        }
    }

    fn excavator() -> FormInput {
        form_input([("name", "Excavator Alpha"), ("type", "Excavator"), ("status", "operational")])
    }

    #[test]
    fn open_create_uses_defaults() {
        let f = fixture::<Equipment>();
        assert!(!f.form.is_open());
        f.form.open_create();
        assert_eq!(f.form.mode(), FormMode::Create);
        assert_eq!(f.form.values()["status"], "operational");
        assert_eq!(f.form.values()["name"], "");
    }

    #[tokio::test]
    async fn submit_on_closed_form() {
        let f = fixture::<Equipment>();
        assert!(matches!(f.form.submit(excavator()).await, Err(Error::FormClosed)));
        assert_eq!(f.client.calls(Op::Insert), 0);
    }

    #[tokio::test]
    async fn create_closes_form_and_toasts() {
        let f = fixture::<Equipment>();
        f.form.open_create();

        let outcome = f.form.submit(excavator()).await.unwrap();
        let Submitted::Created(row) = outcome else {
            panic!("expected a created row");
        };
        assert_eq!(row.name, "Excavator Alpha");
        assert!(!f.form.is_open());
        assert!(f.form.values().is_empty());

        let toasts = f.toaster.visible();
        assert_eq!(toasts[0].kind, ToastKind::Success);
        assert_eq!(toasts[0].message, "Equipment created successfully");
    }

    #[tokio::test]
    async fn malformed_numbers_never_reach_the_client() {
        let f = fixture::<ProductionRecord>();
        f.form.open_create();
        let input = form_input([
            ("date", "2024-05-01"),
            ("shift", "day"),
            ("material_type", "Iron Ore"),
            ("quantity", "12 tons"),
            ("quality", "grade-a"),
            ("location", "Pit 3"),
        ]);

        let err = f.form.submit(input.clone()).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(f.client.calls(Op::Insert), 0);
        assert!(f.form.is_open());
        assert_eq!(f.form.values(), input);
        assert_eq!(f.form.errors().unwrap().problem("quantity"), Some(&Problem::NotANumber("12 tons".to_string())));
        assert!(f.toaster.visible().is_empty());
    }

    #[tokio::test]
    async fn remote_failure_keeps_entered_values() {
        let f = fixture::<Equipment>();
        f.client.fail(Op::Insert, RemoteError::Unavailable("503".to_string()));
        f.form.open_create();

        assert!(matches!(f.form.submit(excavator()).await, Err(Error::Remote(_))));
        assert!(f.form.is_open());
        assert_eq!(f.form.values(), excavator());
        assert!(!f.form.is_submitting());
        assert_eq!(f.toaster.visible()[0].message, "Failed to save equipment");

        f.client.heal(Op::Insert);
        f.form.submit(f.form.values()).await.unwrap();
        assert!(!f.form.is_open());
    }

    #[tokio::test]
    async fn edit_updates_the_existing_row() {
        let f = fixture::<Equipment>();
        let unit = f
            .client
            .inner()
            .insert(&Equipment::parse_fields(&excavator()).unwrap())
            .await
            .unwrap();

        f.form.open_edit(&unit);
        assert_eq!(f.form.values()["name"], "Excavator Alpha");
        f.form.set_field("status", "maintenance");

        let outcome = f.form.submit(f.form.values()).await.unwrap();
        assert_eq!(outcome, Submitted::Updated(unit.id.clone()));
        assert_eq!(f.client.calls(Op::Insert), 0);
        assert_eq!(f.client.inner().list().await.unwrap()[0].status, "maintenance");
        assert_eq!(f.toaster.visible()[0].message, "Equipment updated successfully");
    }

    #[tokio::test]
    async fn signed_out_submit_stays_open_without_toast() {
        let f = fixture::<Equipment>();
        f.session.sign_out();
        f.form.open_create();

        assert!(matches!(f.form.submit(excavator()).await, Err(Error::NotAuthenticated)));
        assert!(f.form.is_open());
        assert!(f.toaster.visible().is_empty());
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_busy() {
        let f = fixture::<Equipment>();
        f.client.hold(Op::Insert);
        f.form.open_create();

        let (first, second) = tokio::join!(f.form.submit(excavator()), async {
            tokio::task::yield_now().await;
            assert!(f.form.is_submitting());
            let second = f.form.submit(excavator()).await;
            f.client.release(Op::Insert);
            second
        });

        assert!(first.is_ok());
        assert!(matches!(second, Err(Error::Busy)));
        assert_eq!(f.client.calls(Op::Insert), 1);
        assert_eq!(f.client.inner().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn dropped_submit_releases_the_form() {
        let f = fixture::<Equipment>();
        f.client.hold(Op::Insert);
        f.form.open_create();

        let timed_out = tokio::time::timeout(Duration::from_millis(20), f.form.submit(excavator())).await;
        assert!(timed_out.is_err());
        assert!(!f.form.is_submitting());
        assert!(f.form.is_open());
    }

    #[tokio::test]
    async fn cancel_while_in_flight_is_not_reopened() {
        let f = fixture::<Equipment>();
        f.client.hold(Op::Insert);
        f.form.open_create();

        let (result, ()) = tokio::join!(f.form.submit(excavator()), async {
            tokio::task::yield_now().await;
            f.form.cancel();
            f.form.open_create();
            f.client.release(Op::Insert);
        });

        result.unwrap();
        // the reopened form is a new one and keeps its defaults
        assert!(f.form.is_open());
        assert_eq!(f.form.values()["name"], "");
    }
}
