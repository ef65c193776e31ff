mod secret_bytes;
