use criterion::{Criterion, criterion_group, criterion_main};
use stock_store::{InMemoryStockStore, ProductId, StockStore, StockTransaction};

fn populated_store(rt: &tokio::runtime::Runtime, products: i64) -> InMemoryStockStore {
    let store = InMemoryStockStore::new();
    rt.block_on(async {
        for product in 1..=products {
            let stock = store.create(ProductId::new(product)).await.unwrap();
            store.write(&stock.with_quantity(1_000_000)).await.unwrap();
        }
    });
    store
}

fn bench_create(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("stock_store/create", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryStockStore::new();
                store.create(ProductId::new(1)).await.unwrap();
            });
        });
    });
}

fn bench_conditional_write(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = populated_store(&rt, 1);

    c.bench_function("stock_store/conditional_write", |b| {
        b.iter(|| {
            rt.block_on(async {
                let stock = store.get(ProductId::new(1)).await.unwrap().unwrap();
                store.write(&stock.with_quantity(stock.quantity - 1)).await.unwrap();
            });
        });
    });
}

fn bench_transaction_10_records(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = populated_store(&rt, 10);

    c.bench_function("stock_store/transaction_commit_10", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut tx = store.begin().await.unwrap();
                for product in 1..=10 {
                    let stock = tx.get(ProductId::new(product)).await.unwrap().unwrap();
                    tx.write(&stock.with_quantity(stock.quantity - 1)).await.unwrap();
                }
                tx.commit().await.unwrap();
            });
        });
    });
}

fn bench_transaction_rollback(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = populated_store(&rt, 10);

    c.bench_function("stock_store/transaction_rollback_10", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut tx = store.begin().await.unwrap();
                for product in 1..=10 {
                    let stock = tx.get(ProductId::new(product)).await.unwrap().unwrap();
                    tx.write(&stock.with_quantity(0)).await.unwrap();
                }
                tx.rollback().await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_create,
    bench_conditional_write,
    bench_transaction_10_records,
    bench_transaction_rollback,
);
criterion_main!(benches);
