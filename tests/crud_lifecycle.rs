use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use minedash::client::{Op, ScriptedClient, SqliteClient};
use minedash::resource::{
    form_input, Equipment, FinancialTransaction, FormInput, InventoryItem, MaintenanceRecord,
    ProductionRecord, Resource, StockStatus, Totals,
};
use minedash::{AppContext, Error, ListState, Page, RemoteError, Submitted, ToastKind};

type Scripted<R> = ScriptedClient<R, SqliteClient<R>>;

fn context() -> Result<AppContext> {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
    AppContext::builder()
        .in_memory()
        .user("site-lead")
        .toast_ttl(Duration::from_secs(60))
        .build()
}

fn scripted_page<R: Resource>(context: &AppContext) -> (Arc<Scripted<R>>, Page<R, Scripted<R>>) {
    let store = SqliteClient::new(context.db().clone(), context.session().clone());
    let client = Arc::new(ScriptedClient::new(store));
    let page = context.page_with(client.clone());
    (client, page)
}

fn excavator() -> FormInput {
    form_input([("name", "Excavator Alpha"), ("type", "Excavator"), ("status", "operational")])
}

fn stock(name: &str, current: &str, minimum: &str) -> FormInput {
    form_input([
        ("name", name),
        ("category", "Consumables"),
        ("current_stock", current),
        ("minimum_stock", minimum),
        ("unit_cost", "2.5"),
    ])
}

fn transaction(kind: &str, amount: &str) -> FormInput {
    form_input([
        ("type", kind),
        ("category", "Operations"),
        ("amount", amount),
        ("description", "Quarterly entry"),
        ("transaction_date", "2024-03-31"),
    ])
}

fn shift_output(material: &str, tons: &str) -> FormInput {
    form_input([
        ("date", "2024-05-02"),
        ("shift", "night"),
        ("material_type", material),
        ("quantity", tons),
        ("quality", "grade-b"),
        ("location", "North Pit"),
    ])
}

fn service(equipment_id: &str) -> FormInput {
    form_input([
        ("equipment_id", equipment_id),
        ("type", "Preventive"),
        ("description", "Replace track pads"),
        ("scheduled_date", "2024-06-15"),
        ("cost", "1800"),
    ])
}

/// Adds one excavator through its own page and returns its ID.
async fn commission_excavator(context: &AppContext) -> Result<String> {
    let fleet = context.page::<Equipment>();
    fleet.open_create();
    match fleet.submit(excavator()).await? {
        Submitted::Created(unit) => Ok(unit.id),
        Submitted::Updated(_) => unreachable!("the form was opened for create"),
    }
}

/// Creating through the form reloads once and never edits the collection
/// directly.
async fn create_reloads_once<R: Resource>(context: &AppContext, input: FormInput) -> Result<()> {
    let (client, page) = scripted_page::<R>(context);
    page.mount().await?;
    let before = page.list().items();

    page.open_create();
    let outcome = page.submit(input).await?;
    assert!(matches!(outcome, Submitted::Created(_)));

    assert_eq!(client.calls(Op::List), 2);
    assert_eq!(client.calls(Op::Insert), 1);
    assert_eq!(page.list().items().len(), before.len() + 1);
    assert!(!page.form().is_open());
    Ok(())
}

#[tokio::test]
async fn create_reloads_once_for_every_kind() -> Result<()> {
    create_reloads_once::<Equipment>(&context()?, excavator()).await?;
    create_reloads_once::<InventoryItem>(&context()?, stock("Drill bits", "40", "10")).await?;
    create_reloads_once::<FinancialTransaction>(&context()?, transaction("revenue", "1000")).await?;
    create_reloads_once::<ProductionRecord>(&context()?, shift_output("Copper Ore", "420.5")).await?;

    let site = context()?;
    let unit = commission_excavator(&site).await?;
    create_reloads_once::<MaintenanceRecord>(&site, service(&unit)).await?;
    Ok(())
}

#[tokio::test]
async fn failed_maintenance_save_keeps_form() -> Result<()> {
    let context = context()?;
    let unit = commission_excavator(&context).await?;
    let (client, page) = scripted_page::<MaintenanceRecord>(&context);
    page.mount().await?;

    client.fail(Op::Insert, RemoteError::Unavailable("gateway timeout".to_string()));
    page.open_create();
    let entered = service(&unit);
    assert!(matches!(page.submit(entered.clone()).await, Err(Error::Remote(_))));
    assert!(page.form().is_open());
    assert_eq!(page.form().values(), entered);
    assert!(page.list().items().is_empty());
    assert_eq!(client.calls(Op::List), 1);

    let last = context.toaster().visible().pop().map(|t| t.message);
    assert_eq!(last.as_deref(), Some("Failed to save maintenance record"));
    Ok(())
}

#[tokio::test]
async fn maintenance_stays_within_its_owners_equipment() -> Result<()> {
    let context = context()?;
    let alices_unit = commission_excavator(&context).await?;

    context.session().sign_in("bob");
    let bobs_unit = commission_excavator(&context).await?;
    let page = context.page::<MaintenanceRecord>();
    page.open_create();
    assert!(matches!(page.submit(service(&alices_unit)).await, Err(Error::Remote(_))));
    assert!(page.form().is_open());
    let last = context.toaster().visible().pop().map(|t| t.message);
    assert_eq!(last.as_deref(), Some("Failed to save maintenance record"));

    page.open_create();
    page.submit(service(&bobs_unit)).await?;
    let bobs_work = page.list().items();
    assert_eq!(bobs_work.len(), 1);

    context.session().sign_in("site-lead");
    let fleet = context.page::<Equipment>();
    fleet.delete(&alices_unit).await?;
    assert!(fleet.list().items().is_empty());

    context.session().sign_in("bob");
    page.mount().await?;
    assert_eq!(page.list().items(), bobs_work);
    Ok(())
}

#[tokio::test]
async fn remote_failures_keep_list_and_form() -> Result<()> {
    let context = context()?;
    let (client, page) = scripted_page::<Equipment>(&context);
    page.open_create();
    page.submit(excavator()).await?;
    let loaded = page.list().items();
    assert_eq!(loaded.len(), 1);

    // insert
    client.fail(Op::Insert, RemoteError::Unavailable("gateway timeout".to_string()));
    page.open_create();
    let entered = form_input([("name", "Haul Truck 9"), ("type", "Haul Truck")]);
    assert!(matches!(page.submit(entered.clone()).await, Err(Error::Remote(_))));
    assert_eq!(page.list().items(), loaded);
    assert!(page.form().is_open());
    assert_eq!(page.form().values(), entered);

    // update
    client.fail(Op::Update, RemoteError::Query("constraint failed".to_string()));
    page.open_edit(&loaded[0]);
    page.form().set_field("status", "down");
    let edited = page.form().values();
    assert!(page.submit(edited.clone()).await.is_err());
    assert_eq!(page.list().items(), loaded);
    assert_eq!(page.form().values(), edited);

    // delete
    client.fail(Op::Delete, RemoteError::Unavailable("reset".to_string()));
    assert!(page.delete(&loaded[0].id).await.is_err());
    assert_eq!(page.list().items(), loaded);
    assert!(matches!(page.list().state(), ListState::Loaded(_)));

    let failures: Vec<String> = context
        .toaster()
        .visible()
        .into_iter()
        .filter(|t| t.kind == ToastKind::Failure)
        .map(|t| t.message)
        .collect();
    assert_eq!(
        failures,
        vec![
            "Failed to save equipment",
            "Failed to save equipment",
            "Failed to delete equipment"
        ]
    );
    Ok(())
}

#[tokio::test]
async fn edit_then_cancel_writes_nothing() -> Result<()> {
    let context = context()?;
    let (client, page) = scripted_page::<InventoryItem>(&context);
    page.open_create();
    page.submit(stock("Ground bolts", "300", "100")).await?;
    let loaded = page.list().items();

    page.open_edit(&loaded[0]);
    page.form().set_field("current_stock", "0");
    page.cancel();

    assert!(!page.form().is_open());
    assert_eq!(client.calls(Op::Update), 0);
    assert_eq!(page.list().items(), loaded);
    page.mount().await?;
    assert_eq!(page.list().items(), loaded);
    Ok(())
}

#[tokio::test]
async fn deleting_twice_is_harmless() -> Result<()> {
    let context = context()?;
    let (client, page) = scripted_page::<ProductionRecord>(&context);
    page.open_create();
    page.submit(shift_output("Iron Ore", "1250")).await?;
    let id = page.list().items()[0].id.clone();

    page.delete(&id).await?;
    assert!(page.list().find(&id).is_none());

    page.delete(&id).await?;
    assert!(page.list().is_loaded());
    assert!(page.list().items().is_empty());
    assert_eq!(client.calls(Op::Delete), 2);
    Ok(())
}

#[tokio::test]
async fn equipment_scenario_persists_only_schema_fields() -> Result<()> {
    let context = context()?;
    let page = context.page::<Equipment>();
    page.mount().await?;

    let mut input = excavator();
    input.insert("efficiency".to_string(), "87".to_string());
    page.open_create();
    page.submit(input).await?;

    let rows = page.list().items();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Excavator Alpha");
    assert_eq!(rows[0].status, "operational");
    assert_eq!(rows[0].user_id, "site-lead");

    let columns = context.db().table_column_names("equipment")?;
    assert!(!columns.iter().any(|c| c == "efficiency"));
    Ok(())
}

#[tokio::test]
async fn stock_status_boundaries() -> Result<()> {
    let context = context()?;
    let page = context.page::<InventoryItem>();
    for (name, current) in [("Empty", "0"), ("At minimum", "10"), ("Just above", "11"), ("Between", "4")] {
        page.open_create();
        page.submit(stock(name, current, "10")).await?;
    }

    let status = |name: &str| {
        page.list()
            .view(|items| items.iter().find(|i| i.name == name).map(|i| i.stock_status()))
            .flatten()
    };
    assert_eq!(status("Empty"), Some(StockStatus::OutOfStock));
    assert_eq!(status("Between"), Some(StockStatus::LowStock));
    assert_eq!(status("At minimum"), Some(StockStatus::LowStock));
    assert_eq!(status("Just above"), Some(StockStatus::InStock));
    assert_eq!(StockStatus::LowStock.label(), "Low Stock");
    Ok(())
}

#[tokio::test]
async fn net_profit_ignores_assets_and_liabilities() -> Result<()> {
    let context = context()?;
    let page = context.page::<FinancialTransaction>();
    for (kind, amount) in [("revenue", "1000"), ("expense", "400"), ("asset", "200")] {
        page.open_create();
        page.submit(transaction(kind, amount)).await?;
    }
    assert_eq!(page.list().view(|rows| Totals::of(rows).net_profit()), Some(600.0));

    page.open_create();
    page.submit(transaction("liability", "5000")).await?;
    assert_eq!(page.list().view(|rows| Totals::of(rows).net_profit()), Some(600.0));
    Ok(())
}

#[tokio::test]
async fn concurrent_submits_insert_once() -> Result<()> {
    let context = context()?;
    let (client, page) = scripted_page::<Equipment>(&context);
    client.hold(Op::Insert);
    page.open_create();

    let (first, second) = tokio::join!(page.submit(excavator()), async {
        tokio::task::yield_now().await;
        let second = page.submit(excavator()).await;
        client.release(Op::Insert);
        second
    });

    assert!(first.is_ok());
    assert!(matches!(second, Err(Error::Busy)));
    assert_eq!(page.list().items().len(), 1);
    Ok(())
}

#[tokio::test]
async fn shutdown_discards_in_flight_work() -> Result<()> {
    let context = context()?;
    let (client, page) = scripted_page::<MaintenanceRecord>(&context);
    client.hold(Op::List);

    let (mounted, ()) = tokio::join!(page.mount(), async {
        tokio::task::yield_now().await;
        context.shutdown();
        client.release(Op::List);
    });

    assert!(matches!(mounted, Err(Error::Disposed)));
    assert!(matches!(page.list().state(), ListState::Idle));
    Ok(())
}

#[tokio::test]
async fn signed_out_mutations_are_rejected() -> Result<()> {
    let context = context()?;
    let page = context.page::<Equipment>();
    context.session().sign_out();

    page.open_create();
    assert!(matches!(page.submit(excavator()).await, Err(Error::NotAuthenticated)));
    assert!(page.form().is_open());
    assert!(context.toaster().visible().is_empty());
    Ok(())
}

#[tokio::test]
async fn file_backed_store_survives_reopen() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("site.db");

    {
        let context = AppContext::builder().path(&path).user("site-lead").build()?;
        let page = context.page::<Equipment>();
        page.open_create();
        page.submit(excavator()).await?;
        context.shutdown();
    }

    let context = AppContext::builder().path(&path).user("site-lead").build()?;
    let page = context.page::<Equipment>();
    page.mount().await?;
    assert_eq!(page.list().items()[0].name, "Excavator Alpha");
    Ok(())
}
