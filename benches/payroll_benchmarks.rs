//! Performance benchmarks for the payroll engine.
//!
//! This benchmark suite covers the two hot paths:
//! - Single payroll calculation (pure, no store)
//! - Payroll batch run over 10 and 100 employees with a month of attendance
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;
use uuid::Uuid;

use payroll_engine::audit::{Actor, MemoryAuditSink};
use payroll_engine::calculation::{PayrollInput, calculate_payroll};
use payroll_engine::clock::FixedClock;
use payroll_engine::config::{EngineConfig, PayrollPolicy};
use payroll_engine::models::{Attendance, AttendancePeriod, AttendanceStatus};
use payroll_engine::services::{CreateEmployee, CreatePeriod, ProcessPayroll, Services};
use payroll_engine::store::{MemoryStore, Store};

fn june(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
}

fn noon(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(12, 0, 0).unwrap()
}

/// Services with `employees` active employees who attended every weekday of
/// June 2024, and the June period active.
async fn seeded(employees: usize) -> (Services, AttendancePeriod, Actor) {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(noon(june(3))));
    let services = Services::new(
        store.clone(),
        Arc::new(MemoryAuditSink::new()),
        clock,
        EngineConfig::default(),
    );
    let admin = Actor::new(Uuid::new_v4());

    let period = services
        .periods
        .create(
            CreatePeriod {
                name: "June 2024".to_string(),
                start_date: june(1),
                end_date: june(30),
                is_active: None,
            },
            &admin,
        )
        .await
        .unwrap();

    let mut ids = Vec::with_capacity(employees);
    for i in 0..employees {
        let employee = services
            .employees
            .create(
                CreateEmployee {
                    employee_number: format!("B{:04}", i),
                    full_name: format!("Bench Employee {}", i),
                    email: format!("bench{}@example.com", i),
                    department: "Operations".to_string(),
                    position: "Analyst".to_string(),
                    monthly_salary: Decimal::from(5000 + i as i64 * 10),
                    status: None,
                },
                &admin,
            )
            .await
            .unwrap();
        ids.push(employee.id);
    }

    let period_id = period.id;
    store
        .transaction(move |tx| {
            for employee_id in &ids {
                for day in june(1).iter_days().take_while(|d| d.month() == 6) {
                    if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                        continue;
                    }
                    tx.attendance().insert(Attendance {
                        id: Uuid::new_v4(),
                        employee_id: *employee_id,
                        attendance_period_id: period_id,
                        date: day,
                        check_in_time: noon(day),
                        status: AttendanceStatus::Present,
                        notes: None,
                        created_by: *employee_id,
                        created_at: noon(day),
                        updated_at: noon(day),
                    })?;
                }
            }
            Ok(())
        })
        .await
        .unwrap();

    (services, period, admin)
}

/// Benchmark: One payroll calculation.
fn bench_calculate_payroll(c: &mut Criterion) {
    let input = PayrollInput {
        employee_id: Uuid::new_v4(),
        employee_name: "Howard Hoeger".to_string(),
        monthly_salary: Decimal::from_str("5749.58").unwrap(),
        period_start: june(1),
        period_end: june(30),
        attended_days: 18,
        overtime_hours: Decimal::from(7),
        reimbursements: Decimal::from_str("120.50").unwrap(),
    };
    let policy = PayrollPolicy::default();

    c.bench_function("calculate_payroll", |b| {
        b.iter(|| black_box(calculate_payroll(black_box(&input), &policy).unwrap()))
    });
}

/// Benchmark: Full payroll run for a period.
fn bench_payroll_batch(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("payroll_batch");
    group.sample_size(10);

    for employees in [10usize, 100] {
        group.throughput(Throughput::Elements(employees as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(employees),
            &employees,
            |b, &employees| {
                b.to_async(&rt).iter_custom(|iters| async move {
                    let mut total = Duration::ZERO;
                    for _ in 0..iters {
                        let (services, period, admin) = seeded(employees).await;
                        let start = Instant::now();
                        let run = services
                            .payroll
                            .process(
                                ProcessPayroll {
                                    attendance_period_id: period.id,
                                    employee_ids: None,
                                },
                                &admin,
                            )
                            .await
                            .unwrap();
                        total += start.elapsed();
                        black_box(run);
                    }
                    total
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_calculate_payroll, bench_payroll_batch);
criterion_main!(benches);
