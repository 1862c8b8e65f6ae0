// Integration tests. Each test gets its own migrated database.


mod ledger_test;
mod manual_bump_test;
mod pause_resume_test;
mod purchase_test;
mod worker_test;
