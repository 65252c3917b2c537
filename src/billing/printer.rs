// Receipt rendering and the print queue actor
//
// Rendering is pure text layout; delivery goes through a single worker task so
// jobs reach the thermal printer one at a time with a cooldown in between.

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::billing::error::BillingError;
use crate::billing::Bill;

/// Receipt width of the venue's 80mm thermal printer
const RECEIPT_WIDTH: usize = 48;

/// Pause between consecutive print jobs
const PRINT_COOLDOWN: Duration = Duration::from_secs(3);

const QUEUE_CAPACITY: usize = 32;

fn fmt_amount(value: Decimal) -> String {
    value.normalize().to_string()
}

fn rule(ch: char) -> String {
    ch.to_string().repeat(RECEIPT_WIDTH)
}

fn centered(text: &str) -> String {
    if text.len() >= RECEIPT_WIDTH {
        return text.to_string();
    }
    let pad = (RECEIPT_WIDTH - text.len()) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

/// Left text and right-aligned amount on one receipt line
fn split_line(left: &str, right: &str) -> String {
    let gap = RECEIPT_WIDTH.saturating_sub(left.len() + right.len());
    if gap == 0 {
        format!("{} {}", left, right)
    } else {
        format!("{}{}{}", left, " ".repeat(gap), right)
    }
}

/// Lay out a bill as receipt text
pub fn render_bill(bill: &Bill) -> String {
    let mut out = Vec::new();

    out.push(rule('='));
    out.push(centered(&bill.room_name));
    out.push(centered(&format!("({})", bill.room_type)));
    out.push(centered(&format!("Invoice {}", bill.invoice_code)));
    out.push(centered(&format!(
        "{} - {}",
        bill.start_time
            .with_timezone(&crate::billing::VENUE_TZ)
            .format("%d/%m/%Y %H:%M"),
        bill.end_time
            .with_timezone(&crate::billing::VENUE_TZ)
            .format("%H:%M"),
    )));
    out.push(rule('-'));

    for item in &bill.items {
        for line in item.description.split('\n') {
            out.push(line.to_string());
        }
        out.push(split_line(
            &format!(
                "  {} x {}",
                fmt_amount(item.quantity),
                fmt_amount(item.unit_price)
            ),
            &fmt_amount(item.amount),
        ));
    }

    out.push(rule('-'));
    out.push(split_line("Subtotal", &fmt_amount(bill.subtotal)));

    if let Some(promo) = &bill.promotion {
        out.push(split_line(
            &format!("{} (-{}%)", promo.name, fmt_amount(promo.discount_percentage)),
            &format!("-{}", fmt_amount(promo.amount)),
        ));
    }
    if let Some(free) = &bill.free_hour {
        out.push(split_line(
            &format!("Free hour ({} min)", free.minutes_applied),
            &format!("-{}", fmt_amount(free.amount)),
        ));
    }
    if let Some(gift) = &bill.gift {
        if gift.amount > Decimal::ZERO {
            out.push(split_line(
                &format!("Gift: {}", gift.name),
                &format!("-{}", fmt_amount(gift.amount)),
            ));
        }
    }

    out.push(rule('-'));
    out.push(split_line("TOTAL", &fmt_amount(bill.total_amount)));
    if let Some(method) = &bill.payment_method {
        out.push(format!("Paid by {}", method));
    }
    out.push(rule('='));
    out.push(String::new());

    out.join("\n")
}

/// Where rendered receipts are delivered
pub trait PrintTransport: Send + Sync + 'static {
    fn print(&self, document: &str) -> Result<(), String>;
}

/// Transport that writes receipts to the log, used when no printer is wired up
pub struct LogPrinter;

impl PrintTransport for LogPrinter {
    fn print(&self, document: &str) -> Result<(), String> {
        tracing::info!("Printing receipt:\n{}", document);
        Ok(())
    }
}

/// A receipt queued for printing
#[derive(Debug)]
pub struct PrintJob {
    pub label: String,
    pub document: String,
}

/// Handle to the print worker task
///
/// All producers share one channel; the worker drains it strictly in order
/// and waits out the cooldown after each job.
#[derive(Clone)]
pub struct PrintQueue {
    tx: mpsc::Sender<PrintJob>,
}

impl PrintQueue {
    /// Spawn the worker task and return its handle
    pub fn spawn(transport: Arc<dyn PrintTransport>) -> Self {
        let (tx, mut rx) = mpsc::channel::<PrintJob>(QUEUE_CAPACITY);

        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                match transport.print(&job.document) {
                    Ok(()) => tracing::debug!("Printed {}", job.label),
                    Err(err) => tracing::error!("Failed to print {}: {}", job.label, err),
                }
                tokio::time::sleep(PRINT_COOLDOWN).await;
            }
            tracing::debug!("Print queue drained and closed");
        });

        Self { tx }
    }

    /// Queue a receipt; returns once the job is accepted, not printed
    pub async fn enqueue(&self, job: PrintJob) -> Result<(), BillingError> {
        self.tx
            .send(job)
            .await
            .map_err(|_| BillingError::PrintQueue("Print worker has stopped".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::{AppliedPromotion, BillItem, FreeHourDetail, VENUE_TZ};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn sample_bill() -> Bill {
        Bill {
            schedule_id: Uuid::from_u128(1),
            room_id: Uuid::from_u128(2),
            room_name: "Room 301".to_string(),
            room_type: "vip".to_string(),
            invoice_code: "#13031200".to_string(),
            start_time: VENUE_TZ
                .with_ymd_and_hms(2024, 3, 13, 10, 0, 0)
                .unwrap()
                .with_timezone(&Utc),
            end_time: VENUE_TZ
                .with_ymd_and_hms(2024, 3, 13, 12, 0, 0)
                .unwrap()
                .with_timezone(&Utc),
            items: vec![
                BillItem {
                    description: "Karaoke service\n(10:00-12:00)".to_string(),
                    quantity: dec!(2.00),
                    unit_price: dec!(100000),
                    amount: dec!(200000.00),
                    discount_name: None,
                    discount_percentage: None,
                },
                BillItem {
                    description: "Cola".to_string(),
                    quantity: dec!(2),
                    unit_price: dec!(20000),
                    amount: dec!(40000),
                    discount_name: None,
                    discount_percentage: None,
                },
            ],
            subtotal: dec!(240000.00),
            promotion: Some(AppliedPromotion {
                name: "Midweek".to_string(),
                discount_percentage: dec!(10),
                amount: dec!(24000.00),
            }),
            free_hour: Some(FreeHourDetail {
                minutes_applied: 60,
                amount: dec!(100000.00),
            }),
            gift: None,
            total_amount: dec!(116000),
            payment_method: Some("cash".to_string()),
        }
    }

    #[test]
    fn test_render_fits_receipt_width() {
        let text = render_bill(&sample_bill());
        for line in text.lines() {
            assert!(line.len() <= RECEIPT_WIDTH, "too wide: {:?}", line);
        }
    }

    #[test]
    fn test_render_contains_expected_sections() {
        let text = render_bill(&sample_bill());
        assert!(text.contains("Invoice #13031200"));
        assert!(text.contains("Karaoke service"));
        assert!(text.contains("(10:00-12:00)"));
        assert!(text.contains("Midweek (-10%)"));
        assert!(text.contains("Free hour (60 min)"));
        assert!(text.contains("-100000"));
        assert!(text.contains("Paid by cash"));
    }

    #[test]
    fn test_render_right_aligns_total() {
        let text = render_bill(&sample_bill());
        let total_line = text.lines().find(|l| l.starts_with("TOTAL")).unwrap();
        assert_eq!(total_line.len(), RECEIPT_WIDTH);
        assert!(total_line.ends_with("116000"));
    }

    #[test]
    fn test_amount_formatting_strips_trailing_zeros() {
        assert_eq!(fmt_amount(dec!(200000.00)), "200000");
        assert_eq!(fmt_amount(dec!(1.50)), "1.5");
        assert_eq!(fmt_amount(dec!(0)), "0");
    }

    #[test]
    fn test_split_line_width() {
        let line = split_line("Subtotal", "240000");
        assert_eq!(line.len(), RECEIPT_WIDTH);
        assert!(line.starts_with("Subtotal"));
        assert!(line.ends_with("240000"));
    }

    #[tokio::test]
    async fn test_enqueue_reaches_transport() {
        use std::sync::Mutex;

        struct Capture(Mutex<Vec<String>>, Arc<tokio::sync::Notify>);
        impl PrintTransport for Capture {
            fn print(&self, document: &str) -> Result<(), String> {
                self.0.lock().map_err(|e| e.to_string())?.push(document.to_string());
                self.1.notify_one();
                Ok(())
            }
        }

        let notify = Arc::new(tokio::sync::Notify::new());
        let capture = Arc::new(Capture(Mutex::new(Vec::new()), notify.clone()));
        let queue = PrintQueue::spawn(capture.clone());

        queue
            .enqueue(PrintJob {
                label: "test".to_string(),
                document: "hello".to_string(),
            })
            .await
            .unwrap();

        notify.notified().await;
        assert_eq!(capture.0.lock().unwrap().as_slice(), ["hello".to_string()]);
    }
}
