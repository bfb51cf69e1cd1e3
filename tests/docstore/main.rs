// Document store integration tests
