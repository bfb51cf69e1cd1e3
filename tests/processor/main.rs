// Transaction processor integration tests
