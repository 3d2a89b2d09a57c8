//! Cart page, reconciler and the mock bakery server working together.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use countryfresh_cart::{
    CartPage, CartReconciler, CartRemote, CartRow, CartSurface, DeliveryLabel, HttpCartClient,
    Notification, QuantitySignal, RecordingSurface, RowPhase, RowVisual,
};
use countryfresh_core::{CartPricing, LineId, Price, ProductId, Quantity};
use countryfresh_integration_tests::MockBakery;
use rust_decimal::Decimal;

const DEBOUNCE: Duration = Duration::from_millis(40);

struct Harness {
    bakery: MockBakery,
    remote: Arc<HttpCartClient>,
    surface: Arc<RecordingSurface>,
    reconciler: CartReconciler<HttpCartClient, RecordingSurface>,
    page: CartPage,
}

/// Server cart with one Agege Bread (1000) and one Meat Pie (2000).
async fn harness() -> Harness {
    let bakery = MockBakery::start().await;
    let remote = Arc::new(HttpCartClient::new(bakery.base_url()).unwrap());
    remote.cart_count().await.unwrap();
    remote
        .quick_add(&ProductId::new("1"), Quantity::MIN)
        .await
        .unwrap();
    remote
        .quick_add(&ProductId::new("2"), Quantity::MIN)
        .await
        .unwrap();

    let surface = Arc::new(RecordingSurface::new());
    let reconciler = CartReconciler::new(Arc::clone(&remote), Arc::clone(&surface), DEBOUNCE);
    let signal = QuantitySignal::default();
    reconciler.attach(signal.subscribe());

    let rows = vec![
        CartRow::new(
            ProductId::new("1"),
            "Agege Bread",
            Price::naira(Decimal::from(1000)),
            Quantity::MIN,
        ),
        CartRow::new(
            ProductId::new("2"),
            "Meat Pie",
            Price::naira(Decimal::from(2000)),
            Quantity::MIN,
        ),
    ];
    let page = CartPage::new(rows, CartPricing::default(), signal);

    Harness {
        bakery,
        remote,
        surface,
        reconciler,
        page,
    }
}

async fn wait_for_phase(
    reconciler: &CartReconciler<HttpCartClient, RecordingSurface>,
    line: &LineId,
    phase: RowPhase,
) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while reconciler.phase(line) != Some(phase) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("row {line} never reached {phase:?}"));
}

#[tokio::test]
async fn test_burst_of_presses_sends_one_update() {
    let mut h = harness().await;
    let bread = LineId::new("1");

    for _ in 0..3 {
        h.page.plus(&bread).unwrap();
    }

    // Totals follow the presses before the server hears anything.
    let view = h.page.render();
    assert_eq!(view.subtotal, "₦5000.00");
    assert_eq!(view.delivery, DeliveryLabel::Free);
    assert!(h.bakery.updates().is_empty());

    wait_for_phase(&h.reconciler, &bread, RowPhase::Confirmed).await;

    assert_eq!(h.bakery.updates(), vec![("1".to_string(), 4)]);
    assert_eq!(h.remote.cart_count().await.unwrap(), 5);
    assert_eq!(h.surface.resyncs(), 1);
    assert_eq!(
        h.surface.visual_history(),
        vec![
            (bread.clone(), RowVisual::Loading),
            (bread, RowVisual::Normal),
        ]
    );
}

#[tokio::test]
async fn test_rows_sync_independently() {
    let mut h = harness().await;
    let bread = LineId::new("1");
    let pie = LineId::new("2");

    h.page.plus(&bread).unwrap();
    h.page.plus(&pie).unwrap();
    h.page.plus(&pie).unwrap();

    wait_for_phase(&h.reconciler, &bread, RowPhase::Confirmed).await;
    wait_for_phase(&h.reconciler, &pie, RowPhase::Confirmed).await;

    let mut updates = h.bakery.updates();
    updates.sort();
    assert_eq!(
        updates,
        vec![("1".to_string(), 2), ("2".to_string(), 3)]
    );
    assert_eq!(h.remote.cart_count().await.unwrap(), 5);
}

#[tokio::test]
async fn test_failed_update_keeps_typed_value() {
    let mut h = harness().await;
    h.bakery.fail_updates(true);
    let pie = LineId::new("2");

    h.page.set_text(&pie, "");
    assert!(h.page.keystroke(&pie, '7'));
    h.page.blur(&pie).unwrap();

    wait_for_phase(&h.reconciler, &pie, RowPhase::Failed).await;

    assert_eq!(
        h.surface.notifications(),
        vec![Notification::error("Failed to update cart")]
    );
    assert_eq!(h.surface.row_visual(&pie), RowVisual::Normal);
    assert_eq!(h.surface.resyncs(), 0);
    assert_eq!(h.page.row(&pie).unwrap().quantity().get(), 7);
    // The server cart is unchanged.
    assert_eq!(h.remote.cart_count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_change_during_slow_request_is_sent_after_it() {
    let mut h = harness().await;
    h.bakery.set_update_delay(Duration::from_millis(200));
    let bread = LineId::new("1");

    h.page.plus(&bread).unwrap();
    wait_for_phase(&h.reconciler, &bread, RowPhase::Submitting).await;
    h.page.plus(&bread).unwrap();

    wait_for_phase(&h.reconciler, &bread, RowPhase::Confirmed).await;

    // Never overlapping, in order, and only the second answer counted.
    assert_eq!(
        h.bakery.updates(),
        vec![("1".to_string(), 2), ("1".to_string(), 3)]
    );
    assert_eq!(h.surface.resyncs(), 1);
    assert_eq!(h.remote.cart_count().await.unwrap(), 4);
}

#[tokio::test]
async fn test_closing_the_page_flushes_pending_change() {
    let h = harness().await;
    let Harness {
        bakery,
        remote,
        reconciler,
        mut page,
        ..
    } = h;
    let pie = LineId::new("2");

    page.plus(&pie).unwrap();
    drop(page);

    tokio::time::timeout(Duration::from_secs(5), async {
        while bakery.updates().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(bakery.updates(), vec![("2".to_string(), 2)]);
    reconciler.shutdown().await;
    assert_eq!(remote.cart_count().await.unwrap(), 3);
}
