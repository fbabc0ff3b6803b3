use alloy::sol;

sol! {
    /// ERC-20 surface the client touches, including the EIP-2612 extension.
    #[sol(rpc)]
    interface IERC20Permit {
        function name() external view returns (string memory);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);

        // EIP-2612
        function nonces(address owner) external view returns (uint256);
        function DOMAIN_SEPARATOR() external view returns (bytes32);
        function permit(
            address owner,
            address spender,
            uint256 value,
            uint256 deadline,
            uint8 v,
            bytes32 r,
            bytes32 s
        ) external;
    }

    /// The EIP-2612 typed-data message. Field order is part of the type hash
    /// and must not change.
    struct Permit {
        address owner;
        address spender;
        uint256 value;
        uint256 nonce;
        uint256 deadline;
    }
}
