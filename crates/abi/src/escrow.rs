use alloy::sol;

sol! {
    /// A deployed escrow instance: fund, release, dispute lifecycle.
    #[sol(rpc)]
    interface IEscrow {
        // Errors
        error Escrow__NotParty(address caller);
        error Escrow__InvalidState();
        error Escrow__AlreadyFunded();
        error Escrow__NotFunded();
        error Escrow__DeadlineNotReached();
        error Escrow__DisputeAlreadyRaised();
        error Escrow__AmountMismatch(uint256 expected, uint256 received);
        error Escrow__TransferFailed();

        // Events
        event EscrowFunded(address indexed funder, uint256 amount);
        event FundsReleased(address indexed recipient, uint256 amount);
        event DisputeRaised(address indexed raisedBy);
        event DisputeResolved(address indexed winner, uint256 amount);

        // Entrypoints
        function fund() external;
        function release() external;
        function raiseDispute() external;
        function resolveDispute(address winner) external;

        // Views
        function state() external view returns (uint8);
        function client() external view returns (address);
        function agent() external view returns (address);
        function amount() external view returns (uint256);
    }
}
