// Transaction client integration tests

mod ledger_test;
